pub mod digest;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/fetch", post(digest::handle_fetch))
        .route("/api/download-resume", post(digest::handle_download_resume))
        .with_state(state)
}
