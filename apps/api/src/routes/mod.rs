pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::fragments::handlers as fragment_handlers;
use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Prompt API
        .route("/api/v1/prompts/generate", post(handlers::handle_generate))
        .route("/api/v1/prompts/enhance", post(handlers::handle_enhance))
        .route("/api/v1/models", get(handlers::handle_list_models))
        .route("/api/v1/styles", get(handlers::handle_list_styles))
        // Fragment API
        .route(
            "/api/v1/fragments/:domain/stats",
            get(fragment_handlers::handle_fragment_stats),
        )
        .with_state(state)
}
