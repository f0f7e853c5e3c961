//! Handler types and dependencies

use std::sync::Arc;

use crate::core::config::Config;
use crate::storage::backend::StorageBackend;
use crate::storage::meta::MetaStore;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers, fixed at startup
#[derive(Clone)]
pub struct HandlerDeps {
    pub config: Arc<Config>,
    pub meta: Arc<MetaStore>,
    pub backend: Arc<dyn StorageBackend>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(config: Arc<Config>, meta: Arc<MetaStore>, backend: Arc<dyn StorageBackend>) -> Self {
        Self { config, meta, backend }
    }
}
