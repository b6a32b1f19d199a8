use super::config::SessionConfig;
use super::stats::{SessionStats, SessionStatus, TranscriptView};
use crate::capture::{CaptureEngine, CaptureError, EndReason, TranscriptEvent};
use crate::metrics::{PaceTracker, SessionClock};
use crate::segment::{Segmenter, TriggerDecision};
use crate::suggest::{
    Orchestrator, SuggestClient, SuggestMode, SuggestRequest, SuggestionBundle, TriggerOrigin,
};
use crate::vision::{self, ClipboardSource, VisionError};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Commands routed through the event loop so that all timer state changes
/// happen in one place.
enum SessionCommand {
    StopListening(oneshot::Sender<()>),
    ResetTranscript(oneshot::Sender<()>),
    Shutdown,
}

/// One Live-Assist session.
///
/// Owns the capture engine, the segmentation policy, the suggestion
/// orchestrator and the metrics trackers, and wires them together with a
/// single event loop: recognition events, the (at most one) silence
/// deadline, user commands and applied-bundle notifications all resolve
/// there, in arrival order.
pub struct LiveSession {
    config: SessionConfig,
    engine: Arc<Mutex<CaptureEngine>>,
    orchestrator: Arc<Orchestrator>,
    clipboard: Arc<dyn ClipboardSource>,
    pace: Arc<Mutex<PaceTracker>>,
    clock: Mutex<SessionClock>,
    started: AtomicBool,
    ended: AtomicBool,
    stats: Mutex<Option<SessionStats>>,
    cmd_tx: mpsc::Sender<SessionCommand>,
    cmd_rx: Mutex<Option<mpsc::Receiver<SessionCommand>>>,
    events_rx: Mutex<Option<mpsc::Receiver<TranscriptEvent>>>,
    applied_rx: Mutex<Option<mpsc::Receiver<SuggestionBundle>>>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl LiveSession {
    /// Create a session. The speech backend, generation client and
    /// clipboard source are injected; nothing runs until `start`.
    pub fn new(
        config: SessionConfig,
        backend: Box<dyn crate::capture::SpeechBackend>,
        client: Arc<dyn SuggestClient>,
        clipboard: Arc<dyn ClipboardSource>,
    ) -> Self {
        let (engine, events_rx) = CaptureEngine::new(backend);
        let (orchestrator, applied_rx) = Orchestrator::new(client);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);

        Self {
            config,
            engine: Arc::new(Mutex::new(engine)),
            orchestrator: Arc::new(orchestrator),
            clipboard,
            pace: Arc::new(Mutex::new(PaceTracker::new())),
            clock: Mutex::new(SessionClock::new()),
            started: AtomicBool::new(false),
            ended: AtomicBool::new(false),
            stats: Mutex::new(None),
            cmd_tx,
            cmd_rx: Mutex::new(Some(cmd_rx)),
            events_rx: Mutex::new(Some(events_rx)),
            applied_rx: Mutex::new(Some(applied_rx)),
            loop_handle: Mutex::new(None),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start the session: spawn the event loop and the duration ticker,
    /// then begin listening.
    pub async fn start(&self) -> Result<(), CaptureError> {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Session {} already started", self.config.session_id);
            return Ok(());
        }

        info!("Starting live session: {}", self.config.session_id);

        self.clock.lock().await.start();

        let events_rx = self.events_rx.lock().await.take();
        let applied_rx = self.applied_rx.lock().await.take();
        let cmd_rx = self.cmd_rx.lock().await.take();

        match (events_rx, applied_rx, cmd_rx) {
            (Some(events_rx), Some(applied_rx), Some(cmd_rx)) => {
                let segmenter = Segmenter::new(self.config.segmentation.clone());
                let handle = tokio::spawn(run_loop(LoopContext {
                    engine: Arc::clone(&self.engine),
                    orchestrator: Arc::clone(&self.orchestrator),
                    pace: Arc::clone(&self.pace),
                    config: self.config.clone(),
                    segmenter,
                    events_rx,
                    applied_rx,
                    cmd_rx,
                }));
                *self.loop_handle.lock().await = Some(handle);
            }
            _ => {
                error!(
                    "Session {} loop channels missing; refusing to start twice",
                    self.config.session_id
                );
            }
        }

        self.listen().await
    }

    /// Begin (or explicitly restart) listening. No-op while listening; the
    /// restart path exists because the provider can end the stream on its
    /// own and a supervising caller decides whether to resume.
    pub async fn listen(&self) -> Result<(), CaptureError> {
        if self.ended.load(Ordering::SeqCst) {
            warn!("Session {} has ended; not listening", self.config.session_id);
            return Ok(());
        }
        self.engine.lock().await.start().await
    }

    /// Stop listening. The transcript is preserved and the pending silence
    /// deadline is cancelled before the recognizer halts.
    pub async fn stop_listening(&self) {
        if !self.loop_running().await {
            // No loop, no timer to cancel; stop the engine directly
            let _ = self.engine.lock().await.stop().await;
            return;
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(SessionCommand::StopListening(ack_tx))
            .await
            .is_ok()
        {
            let _ = ack_rx.await;
        } else {
            let _ = self.engine.lock().await.stop().await;
        }
    }

    /// Clear the transcript and interim text. Idempotent on an idle session.
    pub async fn reset(&self) {
        if !self.loop_running().await {
            self.engine.lock().await.reset().await;
            return;
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(SessionCommand::ResetTranscript(ack_tx))
            .await
            .is_ok()
        {
            let _ = ack_rx.await;
        } else {
            self.engine.lock().await.reset().await;
        }
    }

    async fn loop_running(&self) -> bool {
        self.loop_handle.lock().await.is_some()
    }

    /// Manual topic-change request. Bypasses the trigger policies and
    /// cancels no timers.
    pub async fn pivot(&self) -> bool {
        let transcript = self.engine.lock().await.transcript().await;
        let request = build_request(&self.config, Some(transcript), SuggestMode::Pivot, None);
        self.orchestrator.trigger(request, TriggerOrigin::Manual).await
    }

    /// Screenshot analysis request: clipboard image in place of transcript.
    pub async fn vision(&self) -> Result<bool, VisionError> {
        let image = vision::capture_payload(Arc::clone(&self.clipboard)).await?;
        let request = build_request(&self.config, None, SuggestMode::Vision, Some(image));
        Ok(self.orchestrator.trigger(request, TriggerOrigin::Manual).await)
    }

    pub async fn status(&self) -> SessionStatus {
        let (state, has_support) = {
            let engine = self.engine.lock().await;
            (engine.state(), engine.has_support())
        };
        let (bundle, loading) = self.orchestrator.snapshot().await;
        let pace = self.pace.lock().await;

        SessionStatus {
            session_id: self.config.session_id.clone(),
            state,
            has_support,
            loading,
            duration_seconds: self.clock.lock().await.seconds(),
            current_wpm: pace.current_wpm(),
            pace_band: pace.current_band(),
            suggestion_seq: bundle.map(|b| b.seq),
            ended: self.ended.load(Ordering::SeqCst),
        }
    }

    pub async fn transcript(&self) -> TranscriptView {
        let engine = self.engine.lock().await;
        TranscriptView {
            transcript: engine.transcript().await,
            interim: engine.interim().await,
        }
    }

    /// Atomic snapshot of the current bundle and loading flag.
    pub async fn suggestions(&self) -> (Option<SuggestionBundle>, bool) {
        self.orchestrator.snapshot().await
    }

    /// End the session. Cancels timers, stops capture, aborts any in-flight
    /// suggestion request and computes the summary exactly once; subsequent
    /// calls return the stored summary.
    pub async fn end(&self) -> SessionStats {
        if self.ended.swap(true, Ordering::SeqCst) {
            if let Some(stats) = self.stats.lock().await.clone() {
                return stats;
            }
        }

        info!("Ending live session: {}", self.config.session_id);

        // Tear the loop down first so no timer fires mid-teardown
        let _ = self.cmd_tx.send(SessionCommand::Shutdown).await;
        if let Some(handle) = self.loop_handle.lock().await.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("Session loop panicked: {}", e);
                }
            }
        }

        {
            let mut engine = self.engine.lock().await;
            if let Err(e) = engine.stop().await {
                warn!("Failed to stop capture engine: {}", e);
            }
        }
        self.orchestrator.shutdown().await;
        self.clock.lock().await.stop();

        let transcript = self.engine.lock().await.transcript().await;
        let pace = self.pace.lock().await;

        let stats = SessionStats {
            session_id: self.config.session_id.clone(),
            ended_at: Utc::now(),
            duration_seconds: self.clock.lock().await.seconds(),
            word_count: crate::metrics::word_count(&transcript),
            pace_history: pace.history().to_vec(),
            average_pace: pace.average(),
            transcript,
        };
        drop(pace);

        *self.stats.lock().await = Some(stats.clone());

        info!(
            "Session {} ended: {}s, {} words, average pace {}",
            stats.session_id, stats.duration_seconds, stats.word_count, stats.average_pace
        );

        stats
    }
}

struct LoopContext {
    engine: Arc<Mutex<CaptureEngine>>,
    orchestrator: Arc<Orchestrator>,
    pace: Arc<Mutex<PaceTracker>>,
    config: SessionConfig,
    segmenter: Segmenter,
    events_rx: mpsc::Receiver<TranscriptEvent>,
    applied_rx: mpsc::Receiver<SuggestionBundle>,
    cmd_rx: mpsc::Receiver<SessionCommand>,
}

/// One resolved wake-up of the event loop
enum LoopEvent {
    Transcript(Option<TranscriptEvent>),
    SilenceElapsed,
    Applied(Option<SuggestionBundle>),
    Command(Option<SessionCommand>),
}

/// The session event loop. All state transitions resolve here: recognition
/// events, the silence deadline, user commands, applied bundles.
async fn run_loop(mut ctx: LoopContext) {
    loop {
        let deadline = ctx.segmenter.deadline();
        // The branch is disabled when there is no deadline; the fallback
        // instant is never slept on.
        let sleep_target =
            deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(86_400));

        let event = tokio::select! {
            event = ctx.events_rx.recv() => LoopEvent::Transcript(event),
            _ = tokio::time::sleep_until(sleep_target), if deadline.is_some() => {
                LoopEvent::SilenceElapsed
            }
            bundle = ctx.applied_rx.recv() => LoopEvent::Applied(bundle),
            command = ctx.cmd_rx.recv() => LoopEvent::Command(command),
        };

        match event {
            LoopEvent::Transcript(Some(TranscriptEvent::Growth { len })) => {
                if ctx.segmenter.note_growth(len, Instant::now()) == TriggerDecision::Dispatch {
                    dispatch_current(&mut ctx).await;
                }
            }
            LoopEvent::Transcript(Some(TranscriptEvent::Interim)) => {}
            LoopEvent::Transcript(Some(TranscriptEvent::Ended(reason))) => {
                ctx.segmenter.clear();
                if reason != EndReason::Stopped {
                    warn!("Recognizer stream ended unexpectedly: {:?}", reason);
                }
            }
            LoopEvent::Transcript(None) => break,

            LoopEvent::SilenceElapsed => {
                if ctx.segmenter.on_silence() == TriggerDecision::Dispatch {
                    let dispatched = dispatch_current(&mut ctx).await;
                    if dispatched && ctx.segmenter.stop_on_silence() {
                        if let Err(e) = ctx.engine.lock().await.stop().await {
                            warn!("Failed to stop capture after silence: {}", e);
                        }
                    }
                }
            }

            LoopEvent::Applied(Some(bundle)) => {
                // Pace samples only accumulate while actively listening
                if ctx.engine.lock().await.is_listening() {
                    if let Some(band) = ctx.pace.lock().await.observe(&bundle) {
                        debug!("Pace sample {:?} ({:?})", bundle.pace_numeric(), band);
                    }
                }
            }
            LoopEvent::Applied(None) => break,

            LoopEvent::Command(Some(SessionCommand::StopListening(ack))) => {
                ctx.segmenter.clear();
                if let Err(e) = ctx.engine.lock().await.stop().await {
                    warn!("Failed to stop capture engine: {}", e);
                }
                let _ = ack.send(());
            }
            LoopEvent::Command(Some(SessionCommand::ResetTranscript(ack))) => {
                ctx.segmenter.reset();
                ctx.engine.lock().await.reset().await;
                let _ = ack.send(());
            }
            LoopEvent::Command(Some(SessionCommand::Shutdown)) | LoopEvent::Command(None) => break,
        }
    }
}

/// Dispatch a suggestion request for the transcript captured so far.
/// Zero-length utterances (after trimming) are never dispatched.
async fn dispatch_current(ctx: &mut LoopContext) -> bool {
    let transcript = ctx.engine.lock().await.transcript().await;
    if transcript.trim().is_empty() {
        return false;
    }

    let len = transcript.chars().count();
    let request = build_request(&ctx.config, Some(transcript), SuggestMode::Default, None);

    let issued = ctx
        .orchestrator
        .trigger(request, TriggerOrigin::Automatic)
        .await;
    if issued {
        ctx.segmenter.mark_dispatched(len);
    }
    issued
}

fn build_request(
    config: &SessionConfig,
    transcript: Option<String>,
    mode: SuggestMode,
    image: Option<String>,
) -> SuggestRequest {
    SuggestRequest {
        transcript,
        profile: config.profile.clone(),
        config: config.interview.clone(),
        mode,
        image,
    }
}
