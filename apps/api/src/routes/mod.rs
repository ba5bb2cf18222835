pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/", get(health::health_handler))
        .route("/health", get(health::health_handler))
        // Match API
        .route("/api/v1/match", post(handlers::handle_match))
        .route(
            "/api/v1/match/pdf",
            post(handlers::handle_match_upload).layer(upload_limit),
        )
        .route("/api/v1/matches", get(handlers::handle_list_matches))
        .route("/api/v1/matches/:id", get(handlers::handle_get_match))
        // Unversioned paths kept for existing clients
        .route("/match", post(handlers::handle_match))
        .route(
            "/match/pdf",
            post(handlers::handle_match_upload).layer(upload_limit),
        )
        .with_state(state)
}
