use super::state::AppState;
use crate::capture::{CaptureError, NatsSpeechBackend, SpeechBackendConfig};
use crate::profile::{self, CandidateProfile, ProfileMatch};
use crate::segment::{SegmentationConfig, TriggerPolicy};
use crate::session::{InterviewConfig, LiveSession, SessionConfig, SessionStats};
use crate::suggest::SuggestionBundle;
use crate::vision::VisionError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,

    /// Trigger policy (default: growth_threshold)
    pub policy: Option<TriggerPolicy>,

    /// Auto-turn-taking variant: stop capture once silence fires
    pub stop_on_silence: Option<bool>,

    /// Silence debounce delay in milliseconds (default: 2000)
    pub silence_delay_ms: Option<u64>,

    /// Growth threshold in characters (default: 50)
    pub growth_threshold: Option<usize>,

    pub interview: Option<InterviewConfig>,

    /// Candidate profile snapshot sent with every suggestion request
    pub profile: Option<CandidateProfile>,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ListenResponse {
    pub session_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub session_id: String,
    /// False when the trigger was dropped because a request is in flight
    pub accepted: bool,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub bundle: Option<SuggestionBundle>,
    pub loading: bool,
}

#[derive(Debug, Serialize)]
pub struct EndSessionResponse {
    pub session_id: String,
    pub status: String,
    pub stats: SessionStats,
    pub summary_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn not_found(session_id: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Session {} not found", session_id),
        }),
    )
        .into_response()
}

fn capture_error(e: CaptureError) -> axum::response::Response {
    let status = match e {
        CaptureError::PermissionDenied => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions/start
/// Create a live session and begin listening
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> impl IntoResponse {
    let session_id = req
        .session_id
        .unwrap_or_else(|| format!("assist-{}", uuid::Uuid::new_v4()));

    info!("Starting live session: {}", session_id);

    // Check for an existing session under the same id
    {
        let sessions = state.sessions.read().await;
        if sessions.contains_key(&session_id) {
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: format!("Session {} already exists", session_id),
                }),
            )
                .into_response();
        }
    }

    let defaults = SegmentationConfig::default();
    let segmentation = SegmentationConfig {
        policy: req.policy.unwrap_or(defaults.policy),
        silence_delay: req
            .silence_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.silence_delay),
        growth_threshold: req.growth_threshold.unwrap_or(defaults.growth_threshold),
        stop_on_silence: req.stop_on_silence.unwrap_or(defaults.stop_on_silence),
    };

    let config = SessionConfig {
        session_id: session_id.clone(),
        nats_url: state.config.capture.nats_url.clone(),
        language: state.config.capture.language.clone(),
        segmentation,
        interview: req.interview.unwrap_or_default(),
        profile: req.profile.unwrap_or_default(),
    };

    let backend = NatsSpeechBackend::new(
        config.nats_url.clone(),
        session_id.clone(),
        SpeechBackendConfig {
            language: config.language.clone(),
            interim_results: true,
        },
    );

    let session = Arc::new(LiveSession::new(
        config,
        Box::new(backend),
        Arc::clone(&state.suggest_client),
        Arc::clone(&state.clipboard),
    ));

    if let Err(e) = session.start().await {
        error!("Failed to start session: {}", e);
        return capture_error(e);
    }

    // Store session
    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id.clone(), session);
    }

    info!("Live session started: {}", session_id);

    (
        StatusCode::OK,
        Json(StartSessionResponse {
            session_id: session_id.clone(),
            status: "listening".to_string(),
            message: format!("Live session {} started", session_id),
        }),
    )
        .into_response()
}

/// POST /sessions/:session_id/listen/start
/// Resume listening after a user stop or a provider-side stream end
pub async fn resume_listening(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => match session.listen().await {
            Ok(()) => (
                StatusCode::OK,
                Json(ListenResponse {
                    session_id,
                    status: "listening".to_string(),
                }),
            )
                .into_response(),
            Err(e) => {
                error!("Failed to resume listening: {}", e);
                capture_error(e)
            }
        },
        None => not_found(&session_id),
    }
}

/// POST /sessions/:session_id/listen/stop
/// Stop listening; the transcript is preserved
pub async fn stop_listening(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => {
            session.stop_listening().await;
            (
                StatusCode::OK,
                Json(ListenResponse {
                    session_id,
                    status: "stopped".to_string(),
                }),
            )
                .into_response()
        }
        None => not_found(&session_id),
    }
}

/// POST /sessions/:session_id/pivot
/// Manual topic-change suggestion request
pub async fn pivot(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => {
            let accepted = session.pivot().await;
            (
                StatusCode::OK,
                Json(TriggerResponse {
                    session_id,
                    accepted,
                }),
            )
                .into_response()
        }
        None => not_found(&session_id),
    }
}

/// POST /sessions/:session_id/vision
/// Suggestion request from the clipboard screenshot
pub async fn vision(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => match session.vision().await {
            Ok(accepted) => (
                StatusCode::OK,
                Json(TriggerResponse {
                    session_id,
                    accepted,
                }),
            )
                .into_response(),
            Err(VisionError::NoImage) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse {
                    error: VisionError::NoImage.to_string(),
                }),
            )
                .into_response(),
            Err(e) => {
                error!("Vision capture failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: e.to_string(),
                    }),
                )
                    .into_response()
            }
        },
        None => not_found(&session_id),
    }
}

/// GET /sessions/:session_id/status
pub async fn get_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => (StatusCode::OK, Json(session.status().await)).into_response(),
        None => not_found(&session_id),
    }
}

/// GET /sessions/:session_id/transcript
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => (StatusCode::OK, Json(session.transcript().await)).into_response(),
        None => not_found(&session_id),
    }
}

/// GET /sessions/:session_id/suggestions
/// Atomic snapshot of the current bundle and loading flag
pub async fn get_suggestions(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => {
            let (bundle, loading) = session.suggestions().await;
            (StatusCode::OK, Json(SuggestionsResponse { bundle, loading })).into_response()
        }
        None => not_found(&session_id),
    }
}

/// GET /sessions/:session_id/profile/matches
/// Resume entries the live transcript has touched so far
pub async fn get_profile_matches(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => {
            let transcript = session.transcript().await;
            let matches: Vec<ProfileMatch> =
                profile::relevant_entries(&session.config().profile, &transcript.transcript);
            (StatusCode::OK, Json(matches)).into_response()
        }
        None => not_found(&session_id),
    }
}

/// POST /sessions/:session_id/end
/// End the session and return the summary
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    info!("Ending session: {}", session_id);

    // Find and remove session
    let session = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&session_id)
    };

    match session {
        Some(session) => {
            let stats = session.end().await;

            let summary_path =
                match crate::export::write_summary(&state.config.notes.summaries_path, &stats) {
                    Ok(path) => Some(path.to_string_lossy().into_owned()),
                    Err(e) => {
                        warn!("Failed to write session summary: {}", e);
                        None
                    }
                };

            (
                StatusCode::OK,
                Json(EndSessionResponse {
                    session_id,
                    status: "ended".to_string(),
                    stats,
                    summary_path,
                }),
            )
                .into_response()
        }
        None => not_found(&session_id),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
