use crate::config::Config;
use crate::generation::engine::PromptEngine;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Holds configuration only: each request builds its own `PromptEngine`, so no
/// store connection or random state is shared between requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// A fresh engine bound to the configured fragment store.
    pub fn engine(&self) -> PromptEngine {
        PromptEngine::new(self.config.fragment_db_path.clone())
    }
}
