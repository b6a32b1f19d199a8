pub mod client;
pub mod orchestrator;
pub mod types;

pub use client::{HttpSuggestClient, SuggestClient, SuggestError};
pub use orchestrator::{Orchestrator, TriggerOrigin};
pub use types::{SuggestMode, SuggestRequest, SuggestionBundle, Track};
