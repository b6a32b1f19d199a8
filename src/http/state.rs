use crate::config::Config;
use crate::session::LiveSession;
use crate::suggest::{HttpSuggestClient, SuggestClient, SuggestError};
use crate::vision::{ClipboardSource, SystemClipboard};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active live sessions (session_id → session)
    pub sessions: Arc<RwLock<HashMap<String, Arc<LiveSession>>>>,

    pub config: Arc<Config>,

    /// Generation backend client shared by every session
    pub suggest_client: Arc<dyn SuggestClient>,

    /// Clipboard source for vision triggers
    pub clipboard: Arc<dyn ClipboardSource>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, SuggestError> {
        let client = HttpSuggestClient::new(
            config.suggest.base_url.clone(),
            config.suggest.api_key.clone(),
            Duration::from_secs(config.suggest.timeout_secs),
        )?;

        Ok(Self::with_components(
            config,
            Arc::new(client),
            Arc::new(SystemClipboard),
        ))
    }

    /// Build state around injected components (tests substitute scripted
    /// clients and clipboards here).
    pub fn with_components(
        config: Config,
        suggest_client: Arc<dyn SuggestClient>,
        clipboard: Arc<dyn ClipboardSource>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(config),
            suggest_client,
            clipboard,
        }
    }
}
