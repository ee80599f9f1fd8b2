//! fastText bridge
//!
//! Exposes a fastText model to callers outside Rust through a narrow, stable
//! surface: load a model once, then predict labels and compute sentence
//! vectors against it; train and quantize new models on the side.
//!
//! ## Features
//!
//! - **Model handle** - explicit `Uninitialized`/`Ready` lifecycle, one-shot load
//! - **Line-normalized inference** - every query reaches the engine newline-terminated
//! - **Convention-based training output** - `<base>.bin`/`.ftz`, `<base>.vec`, `<base>.output`
//! - **C ABI** - integer status codes, explicit release of returned memory, no unwinding
//!
//! The engine itself sits behind [`Engine`]; enable the `fasttext` feature to
//! link the C++ library and export the handle constructor and training calls.
//!
//! ## Example
//!
//! ```ignore
//! use fasttext_bridge::{FastTextEngine, ModelHandle};
//!
//! let mut handle = ModelHandle::new(FastTextEngine::new());
//! handle.load("models/clf.bin")?;
//!
//! for prediction in handle.predict("the cat sat", 5, 0.0)? {
//!     println!("{} {:.3}", prediction.label, prediction.probability);
//! }
//! ```

pub mod args;
pub mod config;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod handle;
pub mod inference;
pub mod logging;
pub mod persistence;
pub mod training;

// Re-exports for convenience
pub use args::{AutotuneConfig, ModelKind, TrainingArgs, TrainingConfig};
pub use engine::{Engine, Prediction};
pub use error::{BridgeError, Result};
pub use handle::{HandleState, ModelHandle};
pub use inference::normalize_line;
pub use training::{quantize, train, TrainingArtifacts};

#[cfg(feature = "fasttext")]
pub use engine::FastTextEngine;
