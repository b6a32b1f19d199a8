pub mod backend;
pub mod engine;
pub mod nats;

pub use backend::{
    CaptureError, EndReason, RecognitionEvent, SpeechBackend, SpeechBackendConfig,
};
pub use engine::{CaptureEngine, ListenState, TranscriptEvent};
pub use nats::{HypothesisMessage, NatsSpeechBackend, RecognitionControlMessage};
