use super::types::{SuggestRequest, SuggestionBundle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed suggestion payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("backend unavailable after {retries} retries")]
    Exhausted { retries: u32 },
}

/// Generation backend client trait.
///
/// One implementation talks HTTP to the real service; tests substitute
/// scripted ones.
#[async_trait::async_trait]
pub trait SuggestClient: Send + Sync {
    async fn suggest(&self, request: &SuggestRequest) -> Result<SuggestionBundle, SuggestError>;
}

/// HTTP client for the generation backend.
///
/// Posts the request to `{base_url}/suggest` and parses the structured
/// tone-variant response. Retries on 429 and 5xx with exponential backoff.
pub struct HttpSuggestClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSuggestClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SuggestError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/suggest", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl SuggestClient for HttpSuggestClient {
    async fn suggest(&self, request: &SuggestRequest) -> Result<SuggestionBundle, SuggestError> {
        let mut last_error: Option<SuggestError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Suggestion call attempt {} failed, retrying after {}ms",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut builder = self.client.post(self.endpoint()).json(request);
            if let Some(key) = &self.api_key {
                builder = builder.bearer_auth(key);
            }

            let response = match builder.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(SuggestError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Generation backend returned {}: {}", status, body);
                last_error = Some(SuggestError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(SuggestError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let body = response.text().await.map_err(SuggestError::Http)?;
            let bundle: SuggestionBundle = serde_json::from_str(&body)?;

            debug!(
                "Suggestion call succeeded ({} keywords, pace {:?})",
                bundle.keywords.len(),
                bundle.pace
            );

            return Ok(bundle);
        }

        Err(last_error.unwrap_or(SuggestError::Exhausted {
            retries: MAX_RETRIES,
        }))
    }
}
