pub mod health;

use axum::{extract::DefaultBodyLimit, routing::get, routing::post, Router};

use crate::insight::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Leave headroom over the raw file ceiling for multipart framing.
    let body_limit = state.config.max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/insights", post(handlers::handle_extract_insights))
        .route(
            "/api/v1/insights/skills/match",
            post(handlers::handle_match_skills),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
