pub mod assistant;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume API
        .route("/api/resume/generate", post(handlers::handle_generate))
        .route("/api/resume/:id", get(handlers::handle_get_resume))
        .route("/api/resume/:id/html", get(handlers::handle_get_html))
        // Preview links handed out in generation responses
        .route("/resume/:id", get(handlers::handle_preview))
        .route("/resume/:id/pdf", get(handlers::handle_preview_pdf))
        // AI API
        .route("/api/ai/assistant", post(assistant::assistant_handler))
        .with_state(state)
}
