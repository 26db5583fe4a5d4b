mod digest;
mod thread;

use crate::config::Config;
use crate::hub::Hub;
use crate::store::{MemoryStore, ThreadStore};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ThreadStore>,
    /// Connection registry for thread-level and room-scoped events
    pub hub: Hub,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), Config::default())
    }

    pub fn with_store(store: Arc<dyn ThreadStore>, config: Config) -> Self {
        Self {
            store,
            hub: Hub::new(),
            config: Arc::new(config),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
