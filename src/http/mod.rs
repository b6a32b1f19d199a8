//! HTTP API for driving Live-Assist sessions
//!
//! This module provides a REST API for the client surface:
//! - POST /sessions/start - Create and start a session
//! - POST /sessions/:id/listen/start - Resume listening after a stop
//! - POST /sessions/:id/listen/stop - Stop listening (transcript kept)
//! - POST /sessions/:id/pivot - Manual topic-change suggestion
//! - POST /sessions/:id/vision - Clipboard screenshot suggestion
//! - GET  /sessions/:id/status - Listening state, loading flag, pace
//! - GET  /sessions/:id/transcript - Committed transcript + interim text
//! - GET  /sessions/:id/suggestions - Current suggestion bundle
//! - GET  /sessions/:id/profile/matches - Resume entries the transcript touched
//! - POST /sessions/:id/end - End the session, return the summary
//! - GET  /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
