//! Application state.

use std::sync::Arc;

use kassa_store::Store;

use crate::config::ServiceConfig;
use crate::engine::Engine;

/// Application state shared across handlers.
pub struct AppState {
    /// The storage backend, for reads.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Serialized writes.
    pub engine: Engine,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        tracing::debug!(
            report_offset = %config.report_offset(),
            "Application state initialized"
        );
        Self {
            engine: Engine::new(Arc::clone(&store)),
            store,
            config,
        }
    }
}
