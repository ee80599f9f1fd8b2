//! Explicit, path-addressed save of a handle's model

use std::fs::OpenOptions;
use std::path::Path;

use crate::engine::Engine;
use crate::error::{BridgeError, Result};
use crate::handle::ModelHandle;

/// True when `path` is an existing file that can be opened for writing.
///
/// Nothing is created or truncated.
pub fn is_writable(path: &Path) -> bool {
    OpenOptions::new().write(true).open(path).is_ok()
}

impl<E: Engine> ModelHandle<E> {
    /// Save the handle's model to `path`.
    ///
    /// A ready handle saves unconditionally. Before a model is loaded the
    /// destination must already be writable, otherwise `WriteError`.
    pub fn save_model(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !self.is_ready() {
            if !is_writable(path) {
                return Err(BridgeError::write_error(path, "not writable"));
            }
            log::warn!("Saving a handle with no loaded model to {}", path.display());
        }

        self.engine.save_model(path)?;
        log::info!("Model saved to {}", path.display());
        Ok(())
    }
}
