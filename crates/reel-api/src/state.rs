//! Application state.

use reel_worker::{Pipeline, TaskStore};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(config: ApiConfig, pipeline: Pipeline) -> Self {
        Self { config, pipeline }
    }

    pub fn store(&self) -> &TaskStore {
        self.pipeline.store()
    }
}
