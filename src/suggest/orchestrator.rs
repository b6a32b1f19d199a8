use super::client::{SuggestClient, SuggestError};
use super::types::{SuggestRequest, SuggestionBundle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Who asked for a suggestion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOrigin {
    /// A segmentation policy fired. Dropped while a request is in flight.
    Automatic,
    /// A pivot or vision action. Queued latest-wins while busy.
    Manual,
}

#[derive(Debug, Default)]
struct SuggestionState {
    bundle: Option<SuggestionBundle>,
    /// Gates the spinner overlay. True exactly while a request is running.
    loading: bool,
    last_applied_seq: u64,
}

#[derive(Default)]
struct DispatchQueue {
    in_flight: bool,
    /// The most recent manual trigger that arrived while busy
    queued: Option<SuggestRequest>,
}

/// Suggestion request orchestrator.
///
/// Owns the request/response cycle to the generation backend: at most one
/// request in flight, last-known-good bundle preserved across failures, and
/// monotonic application guarded by an issue-time sequence number so a slow
/// early response can never overwrite a faster later one.
pub struct Orchestrator {
    client: Arc<dyn SuggestClient>,
    state: Arc<Mutex<SuggestionState>>,
    queue: Arc<Mutex<DispatchQueue>>,
    next_seq: Arc<AtomicU64>,
    applied_tx: mpsc::Sender<SuggestionBundle>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Orchestrator {
    /// Create an orchestrator around a backend client.
    ///
    /// Returns the orchestrator plus a receiver announcing every applied
    /// bundle, for the metrics tracker.
    pub fn new(client: Arc<dyn SuggestClient>) -> (Self, mpsc::Receiver<SuggestionBundle>) {
        let (applied_tx, applied_rx) = mpsc::channel(16);

        let orchestrator = Self {
            client,
            state: Arc::new(Mutex::new(SuggestionState::default())),
            queue: Arc::new(Mutex::new(DispatchQueue::default())),
            next_seq: Arc::new(AtomicU64::new(0)),
            applied_tx,
            worker: Arc::new(Mutex::new(None)),
        };

        (orchestrator, applied_rx)
    }

    /// Request suggestions for `request`.
    ///
    /// Returns whether the request was accepted (issued or queued). An
    /// automatic trigger arriving while a request is outstanding is dropped;
    /// a manual one replaces any previously queued manual request and runs
    /// when the outstanding request resolves.
    pub async fn trigger(&self, request: SuggestRequest, origin: TriggerOrigin) -> bool {
        let mut queue = self.queue.lock().await;

        if queue.in_flight {
            return match origin {
                TriggerOrigin::Automatic => {
                    debug!("Dropping automatic trigger while a request is in flight");
                    false
                }
                TriggerOrigin::Manual => {
                    queue.queued = Some(request);
                    true
                }
            };
        }

        queue.in_flight = true;
        drop(queue);

        let handle = self.spawn_worker(request);
        *self.worker.lock().await = Some(handle);

        true
    }

    /// Atomic observation of the current bundle and loading flag.
    pub async fn snapshot(&self) -> (Option<SuggestionBundle>, bool) {
        let state = self.state.lock().await;
        (state.bundle.clone(), state.loading)
    }

    pub async fn bundle(&self) -> Option<SuggestionBundle> {
        self.state.lock().await.bundle.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }

    /// Abort any in-flight request and drop queued work. Called at session
    /// end so a stray late response cannot land after teardown.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.worker.lock().await.take() {
            handle.abort();
        }

        {
            let mut queue = self.queue.lock().await;
            queue.in_flight = false;
            queue.queued = None;
        }

        self.state.lock().await.loading = false;
    }

    fn spawn_worker(&self, first: SuggestRequest) -> JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);
        let queue = Arc::clone(&self.queue);
        let next_seq = Arc::clone(&self.next_seq);
        let applied_tx = self.applied_tx.clone();

        tokio::spawn(async move {
            let mut request = first;
            loop {
                let seq = next_seq.fetch_add(1, Ordering::SeqCst) + 1;
                state.lock().await.loading = true;

                let result = client.suggest(&request).await;
                Self::apply(&state, &applied_tx, seq, result).await;

                // Hold the queue lock across the hand-off so a trigger
                // arriving now either sees in_flight or lands in `queued`.
                let mut queue = queue.lock().await;
                match queue.queued.take() {
                    Some(next) => request = next,
                    None => {
                        queue.in_flight = false;
                        break;
                    }
                }
            }
        })
    }

    /// Apply one resolved request. The loading flag clears on every outcome;
    /// the bundle only changes on a success that is newer than the last
    /// applied one.
    async fn apply(
        state: &Mutex<SuggestionState>,
        applied_tx: &mpsc::Sender<SuggestionBundle>,
        seq: u64,
        result: Result<SuggestionBundle, SuggestError>,
    ) {
        match result {
            Ok(mut bundle) => {
                bundle.seq = seq;
                let announced = {
                    let mut state = state.lock().await;
                    state.loading = false;
                    if seq > state.last_applied_seq {
                        state.last_applied_seq = seq;
                        state.bundle = Some(bundle.clone());
                        true
                    } else {
                        debug!(
                            "Discarding stale suggestion response (seq {} <= {})",
                            seq, state.last_applied_seq
                        );
                        false
                    }
                };
                if announced {
                    let _ = applied_tx.send(bundle).await;
                }
            }
            Err(e) => {
                // Previous bundle stays in place; the next trigger retries
                state.lock().await.loading = false;
                warn!("Suggestion request {} failed: {}", seq, e);
            }
        }
    }
}
