use super::backend::{
    CaptureError, EndReason, RecognitionEvent, SpeechBackend, SpeechBackendConfig,
};
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Hypothesis message published by the external recognizer service
#[derive(Debug, Serialize, Deserialize)]
pub struct HypothesisMessage {
    pub session_id: String,
    pub text: String,
    /// true for interim hypotheses, false for finalized ones
    pub partial: bool,
    pub confidence: f32,
    pub timestamp: String,
    /// Set when the recognizer closes the stream on its own
    #[serde(default)]
    pub stream_end: bool,
}

/// Control message published to the recognizer service
#[derive(Debug, Serialize, Deserialize)]
pub struct RecognitionControlMessage {
    pub session_id: String,
    /// "start" | "stop"
    pub action: String,
    pub language: String,
    pub interim_results: bool,
    pub timestamp: String,
}

/// Speech backend that consumes a recognizer service over NATS.
///
/// The recognizer publishes `HypothesisMessage`s to `asr.hypothesis.<session>`;
/// this backend subscribes, filters by session id, and relays the hypotheses
/// as `RecognitionEvent`s. Recognition is started and stopped with control
/// messages on `asr.control.<session>`.
pub struct NatsSpeechBackend {
    url: String,
    session_id: String,
    config: SpeechBackendConfig,
    client: Option<async_nats::Client>,
    capturing: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl NatsSpeechBackend {
    pub fn new(url: impl Into<String>, session_id: impl Into<String>, config: SpeechBackendConfig) -> Self {
        Self {
            url: url.into(),
            session_id: session_id.into(),
            config,
            client: None,
            capturing: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    fn control_subject(&self) -> String {
        format!("asr.control.{}", self.session_id)
    }

    fn hypothesis_subject(&self) -> String {
        format!("asr.hypothesis.{}", self.session_id)
    }

    async fn publish_control(&self, action: &str) -> Result<(), CaptureError> {
        let client = match &self.client {
            Some(c) => c,
            None => return Ok(()),
        };

        let message = RecognitionControlMessage {
            session_id: self.session_id.clone(),
            action: action.to_string(),
            language: self.config.language.clone(),
            interim_results: self.config.interim_results,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = serde_json::to_vec(&message)
            .map_err(|e| CaptureError::Backend(e.to_string()))?;

        client
            .publish(self.control_subject(), payload.into())
            .await
            .map_err(|e| CaptureError::Backend(e.to_string()))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl SpeechBackend for NatsSpeechBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>, CaptureError> {
        info!("Connecting to recognizer at {}", self.url);

        let client = async_nats::connect(&self.url)
            .await
            .map_err(|e| CaptureError::Backend(format!("NATS connect failed: {}", e)))?;

        let mut subscriber = client
            .subscribe(self.hypothesis_subject())
            .await
            .map_err(|e| CaptureError::Backend(format!("subscribe failed: {}", e)))?;

        self.client = Some(client);
        self.publish_control("start").await?;
        self.capturing.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(100);
        let capturing = Arc::clone(&self.capturing);
        let session_id = self.session_id.clone();

        self.task = Some(tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                if !capturing.load(Ordering::SeqCst) {
                    break;
                }

                match serde_json::from_slice::<HypothesisMessage>(&msg.payload) {
                    Ok(hypothesis) => {
                        if hypothesis.session_id != session_id {
                            continue;
                        }

                        let event = if hypothesis.stream_end {
                            RecognitionEvent::Ended(EndReason::ProviderClosed)
                        } else if hypothesis.partial {
                            RecognitionEvent::Interim(hypothesis.text)
                        } else {
                            RecognitionEvent::Final(hypothesis.text)
                        };

                        let ended = matches!(event, RecognitionEvent::Ended(_));
                        if tx.send(event).await.is_err() {
                            break;
                        }
                        if ended {
                            capturing.store(false, Ordering::SeqCst);
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse hypothesis message: {}", e);
                    }
                }
            }
        }));

        info!("Recognizer stream started for session {}", self.session_id);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.capturing.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        if let Err(e) = self.publish_control("stop").await {
            warn!("Failed to publish recognizer stop: {}", e);
        }

        if let Some(task) = self.task.take() {
            task.abort();
        }

        info!("Recognizer stream stopped for session {}", self.session_id);

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "nats"
    }
}
