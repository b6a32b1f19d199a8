use thiserror::Error;
use tokio::sync::mpsc;

/// A single recognizer hypothesis or stream transition.
///
/// Interim hypotheses are provisional and replaced wholesale by the next
/// hypothesis for the same audio segment. Final hypotheses are committed and
/// appended to the running transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Interim(String),
    Final(String),
    /// The recognizer stream ended. Carries why.
    Ended(EndReason),
}

/// Why a recognizer stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The caller asked for the stream to stop.
    Stopped,
    /// The provider closed the stream on its own (e.g. server-side timeout).
    /// Callers relying on continuous capture must explicitly restart.
    ProviderClosed,
    /// The recognizer reported an error (network, no-speech).
    Failed,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("speech recognition is not available on this system")]
    Unsupported,

    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("recognizer backend error: {0}")]
    Backend(String),
}

/// Configuration for a speech backend
#[derive(Debug, Clone)]
pub struct SpeechBackendConfig {
    /// Recognition locale (one language per session)
    pub language: String,
    /// Whether the recognizer should stream interim hypotheses
    pub interim_results: bool,
}

impl Default for SpeechBackendConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            interim_results: true,
        }
    }
}

/// Continuous speech recognition backend trait
///
/// Implementations wrap an external recognizer that supplies interim and
/// final hypotheses over a stream. The backend is owned by a single capture
/// engine and injected per session; there is no process-wide singleton.
#[async_trait::async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Begin continuous recognition.
    ///
    /// Returns a channel receiver that will receive recognition events.
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>, CaptureError>;

    /// Ask the recognizer to halt.
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Check if the backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}
