//! Shared application state for Axum handlers.
//!
//! Cloned into every request. Each component is either an `Arc` or a cheap
//! value type, and none of them hold mutable state: the store lives on disk
//! and the analysis engine derives everything from its inputs.

use std::sync::Arc;

use crate::config::Config;
use crate::services::{AnalysisEngine, ImageStore};
use crate::validation::UploadPolicy;

/// Shared application state for Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Filesystem image store
    pub store: ImageStore,
    /// Mock analysis engine
    pub engine: AnalysisEngine,
    /// Upload acceptance rules
    pub policy: UploadPolicy,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// Does not touch the filesystem; call [`ImageStore::ensure_dir`] before
    /// serving traffic.
    pub fn new(config: Config) -> Self {
        let store = ImageStore::from_config(&config);
        let policy = UploadPolicy::from_config(&config);

        Self {
            config: Arc::new(config),
            store,
            engine: AnalysisEngine::new(),
            policy,
        }
    }
}
