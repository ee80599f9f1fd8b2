//! Model handle
//!
//! A handle owns exactly one engine instance. It starts `Uninitialized`,
//! becomes `Ready` on the first successful load and stays that way for the
//! rest of its life: later loads are no-ops, so a handle never swaps models.

use std::fs::File;
use std::path::Path;

use crate::engine::Engine;
use crate::error::{BridgeError, Result};

/// Lifecycle of a [`ModelHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleState {
    #[default]
    Uninitialized,
    Ready,
}

/// Externally owned model instance used for inference
#[derive(Debug)]
pub struct ModelHandle<E> {
    pub(crate) engine: E,
    state: HandleState,
}

impl<E: Engine + Default> Default for ModelHandle<E> {
    fn default() -> Self {
        Self::new(E::default())
    }
}

impl<E: Engine> ModelHandle<E> {
    /// Wrap an engine that has not loaded a model yet
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            state: HandleState::Uninitialized,
        }
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == HandleState::Ready
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Load the model at `path` unless one is already loaded.
    ///
    /// A failed load leaves the handle uninitialized, so the caller may retry
    /// with another path.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if self.is_ready() {
            log::debug!("Model already loaded, ignoring load of {}", path.display());
            return Ok(());
        }

        if !is_readable_file(path) {
            return Err(BridgeError::not_found(path));
        }

        self.engine.load_model(path)?;
        self.state = HandleState::Ready;

        log::info!(
            "Model loaded from {} ({}d)",
            path.display(),
            self.engine.dimension()
        );
        Ok(())
    }

    /// Embedding width of the loaded model
    pub fn dimension(&self) -> Result<usize> {
        Ok(self.ready_engine("dimension")?.dimension())
    }

    pub(crate) fn ready_engine(&self, operation: &'static str) -> Result<&E> {
        if self.is_ready() {
            Ok(&self.engine)
        } else {
            Err(BridgeError::NotReady(operation))
        }
    }
}

fn is_readable_file(path: &Path) -> bool {
    File::open(path)
        .and_then(|file| file.metadata())
        .map(|m| m.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::{MockEngine, FIXTURE_DIMENSION};

    #[test]
    fn test_new_handle_is_uninitialized() {
        let handle = ModelHandle::new(MockEngine::default());
        assert_eq!(handle.state(), HandleState::Uninitialized);
        assert!(!handle.is_ready());
    }

    #[test]
    fn test_dimension_before_load_is_not_ready() {
        let handle = ModelHandle::new(MockEngine::default());
        assert!(matches!(handle.dimension(), Err(BridgeError::NotReady(_))));
    }

    #[test]
    fn test_load_fixture_reports_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.bin");
        MockEngine::write_fixture(&model, FIXTURE_DIMENSION);

        let mut handle = ModelHandle::new(MockEngine::default());
        handle.load(&model).unwrap();

        assert!(handle.is_ready());
        assert_eq!(handle.dimension().unwrap(), 100);
    }

    #[test]
    fn test_load_missing_path_is_not_found() {
        let mut handle = ModelHandle::new(MockEngine::default());
        let result = handle.load("/nonexistent/model.bin");

        assert!(matches!(result, Err(BridgeError::NotFound(_))));
        assert_eq!(handle.state(), HandleState::Uninitialized);
    }

    #[test]
    fn test_load_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut handle = ModelHandle::new(MockEngine::default());
        assert!(matches!(
            handle.load(dir.path()),
            Err(BridgeError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_load_unreadable_file_is_not_found() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("locked.bin");
        MockEngine::write_fixture(&model, FIXTURE_DIMENSION);
        std::fs::set_permissions(&model, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not bind a privileged user
        if File::open(&model).is_ok() {
            return;
        }

        let mut handle = ModelHandle::new(MockEngine::default());
        assert!(matches!(handle.load(&model), Err(BridgeError::NotFound(_))));
        assert_eq!(handle.engine().load_count, 0);
    }

    #[test]
    fn test_load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.bin");
        let second = dir.path().join("second.bin");
        MockEngine::write_fixture(&first, 100);
        MockEngine::write_fixture(&second, 300);

        let mut handle = ModelHandle::new(MockEngine::default());
        handle.load(&first).unwrap();
        handle.load(&first).unwrap();
        handle.load(&second).unwrap();

        assert_eq!(handle.engine().load_count, 1);
        assert_eq!(handle.dimension().unwrap(), 100);
    }

    #[test]
    fn test_failed_load_allows_retry() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.bin");
        let good = dir.path().join("good.bin");
        std::fs::write(&broken, "not a model").unwrap();
        MockEngine::write_fixture(&good, 64);

        let mut handle = ModelHandle::new(MockEngine::default());
        assert!(matches!(handle.load(&broken), Err(BridgeError::Engine(_))));
        assert!(!handle.is_ready());

        handle.load(&good).unwrap();
        assert_eq!(handle.dimension().unwrap(), 64);
    }
}
