//! Engine seam
//!
//! The bridge never implements embedding or classification itself; it reaches
//! the wrapped library through [`Engine`]. Lines handed to an engine are
//! already newline-terminated.

#[cfg(feature = "fasttext")]
mod native;
#[cfg(test)]
pub(crate) mod mock;

#[cfg(feature = "fasttext")]
pub use self::native::FastTextEngine;

use std::path::Path;

use serde::Serialize;

use crate::args::TrainingArgs;
use crate::error::{BridgeError, Result};

/// One ranked label from a prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub probability: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

/// Calls the bridge makes into the wrapped library
pub trait Engine {
    /// Load a model file into this instance
    fn load_model(&mut self, path: &Path) -> Result<()>;

    /// Embedding width of the loaded model
    fn dimension(&self) -> usize;

    /// Up to `k` labels scoring at least `threshold`, best first
    fn predict_line(&self, line: &str, k: usize, threshold: f32) -> Result<Vec<Prediction>>;

    /// Embedding of a whole line
    fn sentence_vector(&self, line: &str) -> Result<Vec<f32>>;

    fn save_model(&mut self, path: &Path) -> Result<()>;

    fn train(&mut self, args: &TrainingArgs) -> Result<()>;

    /// Reject settings this engine cannot honour, before anything is written
    fn supports(&self, _args: &TrainingArgs) -> Result<()> {
        Ok(())
    }

    /// Train under automatic hyperparameter search
    fn train_autotune(&mut self, _args: &TrainingArgs) -> Result<()> {
        Err(BridgeError::engine("autotune is not supported by this engine"))
    }

    fn quantize(&mut self, args: &TrainingArgs) -> Result<()>;

    /// Write word vectors in the text `.vec` format
    fn save_vectors(&mut self, path: &Path) -> Result<()>;

    /// Write the output matrix in the text `.vec` format
    fn save_output(&mut self, _path: &Path) -> Result<()> {
        Err(BridgeError::engine(
            "saving the output matrix is not supported by this engine",
        ))
    }
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn load_model(&mut self, path: &Path) -> Result<()> {
        (**self).load_model(path)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn predict_line(&self, line: &str, k: usize, threshold: f32) -> Result<Vec<Prediction>> {
        (**self).predict_line(line, k, threshold)
    }

    fn sentence_vector(&self, line: &str) -> Result<Vec<f32>> {
        (**self).sentence_vector(line)
    }

    fn save_model(&mut self, path: &Path) -> Result<()> {
        (**self).save_model(path)
    }

    fn train(&mut self, args: &TrainingArgs) -> Result<()> {
        (**self).train(args)
    }

    fn supports(&self, args: &TrainingArgs) -> Result<()> {
        (**self).supports(args)
    }

    fn train_autotune(&mut self, args: &TrainingArgs) -> Result<()> {
        (**self).train_autotune(args)
    }

    fn quantize(&mut self, args: &TrainingArgs) -> Result<()> {
        (**self).quantize(args)
    }

    fn save_vectors(&mut self, path: &Path) -> Result<()> {
        (**self).save_vectors(path)
    }

    fn save_output(&mut self, path: &Path) -> Result<()> {
        (**self).save_output(path)
    }
}
