use crate::profile::CandidateProfile;
use crate::session::InterviewConfig;
use serde::{Deserialize, Deserializer, Serialize};

/// One structured talk track: how to open, the core points, how to land it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub hook: String,
    pub meat: String,
    pub close: String,
    /// Relative display score, 0-100. Not statistically calibrated.
    pub confidence: u8,
}

/// The complete set of tone-variant tracks returned by one generation call.
///
/// A bundle is atomic: it is replaced as a whole, so a reader never observes
/// fields from two different responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionBundle {
    pub neutral: Track,
    pub confident: Track,
    pub technical: Track,
    /// Salient transcript terms for highlighting. The backend does not
    /// guarantee these appear in the transcript; consumers must tolerate
    /// mismatches.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Words-per-minute as reported by the backend. Free-form text; see
    /// [`SuggestionBundle::pace_numeric`].
    #[serde(default, deserialize_with = "de_pace")]
    pub pace: String,
    /// Informational tone label
    #[serde(default)]
    pub tone: String,
    /// Issue-time sequence number. Guards monotonic bundle application.
    #[serde(skip)]
    pub seq: u64,
}

impl SuggestionBundle {
    /// WPM digits extracted from `pace`, or None when it carries no digits.
    pub fn pace_numeric(&self) -> Option<u32> {
        crate::metrics::parse_pace(&self.pace)
    }
}

// The backend is asked for a string but sometimes returns a bare number.
fn de_pace<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestMode {
    Default,
    /// Manual topic-change request
    Pivot,
    /// Screenshot analysis request
    Vision,
}

impl SuggestMode {
    fn is_default(&self) -> bool {
        matches!(self, SuggestMode::Default)
    }
}

/// Request payload for the generation backend.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestRequest {
    /// Transcript window the suggestions should answer. Absent in vision
    /// mode, where `image` carries the input instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    pub profile: CandidateProfile,
    pub config: InterviewConfig,
    #[serde(skip_serializing_if = "SuggestMode::is_default")]
    pub mode: SuggestMode,
    /// Base64-encoded PNG, vision mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}
