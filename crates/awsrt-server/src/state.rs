//! Shared application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use awsrt_core::RunEngine;

/// Shared state accessible to all route handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    engine: Arc<RunEngine>,
    started_at: Instant,
}

impl AppState {
    pub fn new(engine: RunEngine) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine: Arc::new(engine),
                started_at: Instant::now(),
            }),
        }
    }

    /// Handle to the engine that can be moved onto a blocking thread.
    pub fn engine(&self) -> Arc<RunEngine> {
        Arc::clone(&self.inner.engine)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awsrt_config::StorageSection;
    use tempfile::TempDir;

    #[test]
    fn test_engine_is_shared() {
        let tmp = TempDir::new().unwrap();
        let engine = RunEngine::open(&StorageSection {
            data_dir: tmp.path().to_path_buf(),
        })
        .unwrap();
        let state = AppState::new(engine);
        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.engine(), &cloned.engine()));
        assert!(state.uptime_secs() < 2);
    }
}
