use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub capture: CaptureConfig,
    pub suggest: SuggestServiceConfig,
    pub notes: NotesConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    /// NATS server the external recognizer publishes hypotheses to
    pub nats_url: String,
    /// Recognition locale, one per session
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestServiceConfig {
    /// Base URL of the generation backend
    pub base_url: String,
    /// Optional bearer token for the generation backend
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct NotesConfig {
    /// Directory where end-of-session summary notes are written
    pub summaries_path: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
