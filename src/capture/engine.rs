use super::backend::{CaptureError, EndReason, RecognitionEvent, SpeechBackend};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Listening state of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenState {
    /// Never started listening
    Idle,
    Listening,
    /// Was listening and has since stopped (user stop or stream end)
    Stopped,
}

/// Transcript change notification forwarded to the session loop.
///
/// Every transcript-affecting event restarts the silence timer, so the loop
/// needs to hear about growth as it happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// The committed transcript grew to `len` characters.
    Growth { len: usize },
    /// The interim hypothesis was replaced. The committed transcript is
    /// unchanged.
    Interim,
    /// The recognizer stream ended.
    Ended(EndReason),
}

#[derive(Debug, Default)]
struct TranscriptState {
    /// Append-only, space-joined finalized utterances
    raw: String,
    /// Most recent not-yet-finalized hypothesis
    interim: String,
}

/// Speech capture engine.
///
/// Wraps a `SpeechBackend` and accumulates its finalized hypotheses into a
/// running transcript. Interim hypotheses are exposed separately and never
/// appended. The engine is the only writer of the transcript.
pub struct CaptureEngine {
    backend: Box<dyn SpeechBackend>,
    state: Arc<Mutex<TranscriptState>>,
    listening: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    has_support: Arc<AtomicBool>,
    events_tx: mpsc::Sender<TranscriptEvent>,
    reader_task: Option<JoinHandle<()>>,
}

impl CaptureEngine {
    /// Create an engine around a backend.
    ///
    /// Returns the engine plus the receiver on which transcript events are
    /// delivered, in arrival order.
    pub fn new(backend: Box<dyn SpeechBackend>) -> (Self, mpsc::Receiver<TranscriptEvent>) {
        let (events_tx, events_rx) = mpsc::channel(100);

        let engine = Self {
            backend,
            state: Arc::new(Mutex::new(TranscriptState::default())),
            listening: Arc::new(AtomicBool::new(false)),
            stopped: Arc::new(AtomicBool::new(false)),
            has_support: Arc::new(AtomicBool::new(true)),
            events_tx,
            reader_task: None,
        };

        (engine, events_rx)
    }

    /// Request continuous recognition.
    ///
    /// No-op when already listening. When the backend reports that the
    /// capability is absent, `has_support` flips to false and nothing else
    /// happens. A permission denial is returned to the caller; it is
    /// reported, not retried.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if self.listening.load(Ordering::SeqCst) {
            warn!("Capture engine already listening");
            return Ok(());
        }

        let events_rx = match self.backend.start().await {
            Ok(rx) => rx,
            Err(CaptureError::Unsupported) => {
                warn!("Speech recognition not supported; capture disabled");
                self.has_support.store(false, Ordering::SeqCst);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.listening.store(true, Ordering::SeqCst);
        self.stopped.store(false, Ordering::SeqCst);

        info!("Capture engine listening (backend: {})", self.backend.name());

        let state = Arc::clone(&self.state);
        let listening = Arc::clone(&self.listening);
        let stopped = Arc::clone(&self.stopped);
        let events_tx = self.events_tx.clone();

        self.reader_task = Some(tokio::spawn(async move {
            Self::read_events(events_rx, state, listening, stopped, events_tx).await;
        }));

        Ok(())
    }

    /// Halt the recognizer. The transcript is preserved; only an explicit
    /// `reset` clears it.
    pub async fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.listening.load(Ordering::SeqCst) {
            return Ok(());
        }

        self.listening.store(false, Ordering::SeqCst);
        self.stopped.store(true, Ordering::SeqCst);
        self.backend.stop().await?;

        // Abort rather than join: the reader may be blocked handing an event
        // to a loop that is itself waiting on this stop.
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }

        info!("Capture engine stopped");

        Ok(())
    }

    /// Clear the transcript and interim text. Does not affect listening
    /// state, and is a no-op on a never-started engine.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.raw.clear();
        state.interim.clear();
    }

    /// The committed transcript so far
    pub async fn transcript(&self) -> String {
        self.state.lock().await.raw.clone()
    }

    /// The current interim hypothesis
    pub async fn interim(&self) -> String {
        self.state.lock().await.interim.clone()
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub fn has_support(&self) -> bool {
        self.has_support.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> ListenState {
        if self.listening.load(Ordering::SeqCst) {
            ListenState::Listening
        } else if self.stopped.load(Ordering::SeqCst) {
            ListenState::Stopped
        } else {
            ListenState::Idle
        }
    }

    async fn read_events(
        mut events_rx: mpsc::Receiver<RecognitionEvent>,
        state: Arc<Mutex<TranscriptState>>,
        listening: Arc<AtomicBool>,
        stopped: Arc<AtomicBool>,
        events_tx: mpsc::Sender<TranscriptEvent>,
    ) {
        loop {
            let event = match events_rx.recv().await {
                Some(event) => event,
                None => {
                    // Channel closed without an explicit end event. If we
                    // were still listening the provider went away on us.
                    if listening.swap(false, Ordering::SeqCst) {
                        stopped.store(true, Ordering::SeqCst);
                        warn!("Recognizer stream closed unexpectedly");
                        let _ = events_tx
                            .send(TranscriptEvent::Ended(EndReason::ProviderClosed))
                            .await;
                    }
                    break;
                }
            };

            match event {
                RecognitionEvent::Interim(text) => {
                    {
                        let mut state = state.lock().await;
                        state.interim = text;
                    }
                    let _ = events_tx.send(TranscriptEvent::Interim).await;
                }
                RecognitionEvent::Final(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    let len = {
                        let mut state = state.lock().await;
                        if !state.raw.is_empty() {
                            state.raw.push(' ');
                        }
                        state.raw.push_str(text);
                        state.interim.clear();
                        state.raw.chars().count()
                    };
                    let _ = events_tx.send(TranscriptEvent::Growth { len }).await;
                }
                RecognitionEvent::Ended(reason) => {
                    listening.store(false, Ordering::SeqCst);
                    stopped.store(true, Ordering::SeqCst);
                    if reason != EndReason::Stopped {
                        warn!("Recognizer stream ended: {:?}", reason);
                    }
                    let _ = events_tx.send(TranscriptEvent::Ended(reason)).await;
                    break;
                }
            }
        }
    }
}
