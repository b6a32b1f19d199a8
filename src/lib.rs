pub mod capture;
pub mod config;
pub mod export;
pub mod http;
pub mod metrics;
pub mod profile;
pub mod segment;
pub mod session;
pub mod suggest;
pub mod vision;

pub use capture::{
    CaptureEngine, CaptureError, EndReason, ListenState, RecognitionEvent, SpeechBackend,
    SpeechBackendConfig, TranscriptEvent,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use profile::{CandidateProfile, ProfileMatch};
pub use segment::{SegmentationConfig, Segmenter, TriggerPolicy};
pub use session::{InterviewConfig, LiveSession, SessionConfig, SessionStats, SessionStatus};
pub use suggest::{
    Orchestrator, SuggestClient, SuggestError, SuggestMode, SuggestRequest, SuggestionBundle,
    Track, TriggerOrigin,
};
pub use vision::{ClipboardImage, ClipboardSource, SystemClipboard, VisionError};
