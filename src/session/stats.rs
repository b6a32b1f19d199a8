use crate::capture::ListenState;
use crate::metrics::PaceBand;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// End-of-session summary.
///
/// Computed exactly once, when the user explicitly ends the session, and
/// immutable thereafter. Handed to the summary view and the note exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    pub ended_at: DateTime<Utc>,

    /// Seconds of session wall time, from the 1-second ticker
    pub duration_seconds: u64,

    /// Whitespace token count of the final transcript
    pub word_count: usize,

    /// One WPM sample per suggestion bundle applied while listening
    pub pace_history: Vec<u32>,

    /// Rounded mean of the pace history, 0 if empty
    pub average_pace: u32,

    pub transcript: String,
}

/// Live status snapshot for a running session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: String,

    pub state: ListenState,

    /// False when speech recognition turned out to be unavailable
    pub has_support: bool,

    /// True exactly while a suggestion request is running
    pub loading: bool,

    pub duration_seconds: u64,

    pub current_wpm: Option<u32>,

    pub pace_band: Option<PaceBand>,

    /// Sequence number of the currently displayed bundle, if any
    pub suggestion_seq: Option<u64>,

    pub ended: bool,
}

/// Committed transcript plus the in-progress hypothesis
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptView {
    pub transcript: String,
    pub interim: String,
}
