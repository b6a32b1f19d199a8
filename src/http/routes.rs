use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/sessions/start", post(handlers::start_session))
        .route(
            "/sessions/:session_id/listen/start",
            post(handlers::resume_listening),
        )
        .route(
            "/sessions/:session_id/listen/stop",
            post(handlers::stop_listening),
        )
        .route("/sessions/:session_id/end", post(handlers::end_session))
        // Manual triggers
        .route("/sessions/:session_id/pivot", post(handlers::pivot))
        .route("/sessions/:session_id/vision", post(handlers::vision))
        // Session queries
        .route("/sessions/:session_id/status", get(handlers::get_status))
        .route(
            "/sessions/:session_id/transcript",
            get(handlers::get_transcript),
        )
        .route(
            "/sessions/:session_id/suggestions",
            get(handlers::get_suggestions),
        )
        .route(
            "/sessions/:session_id/profile/matches",
            get(handlers::get_profile_matches),
        )
        // The browser client talks to us cross-origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
