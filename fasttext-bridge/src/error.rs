//! Error types for fasttext-bridge

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::status;

/// Errors that can occur in the bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No readable file at the given path
    #[error("Model file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Operation attempted before a model was loaded
    #[error("Model not loaded: {0}")]
    NotReady(&'static str),

    /// Caller buffer and model dimension disagree
    #[error("Vector size mismatch: buffer holds {buffer}, model produced {model}")]
    SizeMismatch { buffer: usize, model: usize },

    /// Destination not creatable or writable
    #[error("{} cannot be opened for saving: {reason}", .path.display())]
    WriteError { path: PathBuf, reason: String },

    /// Rejected argument (model kind, flag, value)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Failure reported by the wrapped engine
    #[error("Engine error: {0}")]
    Engine(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Create a not found error
    pub fn not_found(path: impl AsRef<Path>) -> Self {
        Self::NotFound(path.as_ref().to_path_buf())
    }

    /// Create a write error
    pub fn write_error(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::WriteError {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Status code reported across the C boundary
    pub fn status_code(&self) -> i32 {
        match self {
            Self::NotFound(_) => status::NOT_FOUND,
            Self::NotReady(_) => status::NOT_READY,
            Self::SizeMismatch { .. } => status::SIZE_MISMATCH,
            Self::WriteError { .. } => status::WRITE_ERROR,
            Self::InvalidArgument(_) => status::INVALID_ARGUMENT,
            Self::Engine(_) | Self::Json(_) | Self::Io(_) => status::ENGINE_ERROR,
        }
    }
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
