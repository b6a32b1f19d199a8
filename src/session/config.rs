use crate::profile::CandidateProfile;
use crate::segment::SegmentationConfig;
use serde::{Deserialize, Serialize};

/// Interview configuration forwarded with every suggestion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewConfig {
    /// e.g. "Technical", "Behavioral"
    #[serde(default = "default_interview_type")]
    pub interview_type: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    /// Voice the backend should answer in, e.g. "Interview Coach"
    #[serde(default = "default_persona")]
    pub persona: String,
}

fn default_interview_type() -> String {
    "Technical".to_string()
}

fn default_difficulty() -> String {
    "Medium".to_string()
}

fn default_persona() -> String {
    "Interview Coach".to_string()
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            interview_type: default_interview_type(),
            difficulty: default_difficulty(),
            persona: default_persona(),
        }
    }
}

/// Configuration for one Live-Assist session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier (e.g. "assist-2026-08-06-acme")
    pub session_id: String,

    /// NATS server the recognizer publishes hypotheses to
    pub nats_url: String,

    /// Recognition locale, one per session
    pub language: String,

    /// Trigger policy and timing
    pub segmentation: SegmentationConfig,

    pub interview: InterviewConfig,

    /// Candidate profile snapshot sent with every suggestion request
    pub profile: CandidateProfile,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("assist-{}", uuid::Uuid::new_v4()),
            nats_url: "nats://localhost:4222".to_string(),
            language: "en-US".to_string(),
            segmentation: SegmentationConfig::default(),
            interview: InterviewConfig::default(),
            profile: CandidateProfile::default(),
        }
    }
}
