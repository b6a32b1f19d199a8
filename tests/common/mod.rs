// Scripted components shared by the integration tests.
//
// The speech backend, generation client and clipboard are all injection
// seams; these stand-ins let tests drive recognition events by hand and
// observe every suggestion request the pipeline issues.

#![allow(dead_code)]

use async_trait::async_trait;
use live_assist::vision::{ClipboardImage, ClipboardSource, VisionError};
use live_assist::{
    CaptureError, RecognitionEvent, SpeechBackend, SuggestClient, SuggestError, SuggestRequest,
    SuggestionBundle, Track,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{mpsc, Mutex};

/// Speech backend driven by the test: whatever the test sends on the
/// returned sender arrives as recognition events.
pub struct ScriptedBackend {
    events: StdMutex<Option<mpsc::Receiver<RecognitionEvent>>>,
    capturing: AtomicBool,
}

impl ScriptedBackend {
    pub fn new() -> (Self, mpsc::Sender<RecognitionEvent>) {
        let (tx, rx) = mpsc::channel(100);
        let backend = Self {
            events: StdMutex::new(Some(rx)),
            capturing: AtomicBool::new(false),
        };
        (backend, tx)
    }
}

#[async_trait]
impl SpeechBackend for ScriptedBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>, CaptureError> {
        match self.events.lock().unwrap().take() {
            Some(rx) => {
                self.capturing.store(true, Ordering::SeqCst);
                Ok(rx)
            }
            None => Err(CaptureError::Backend("script exhausted".to_string())),
        }
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        self.capturing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Backend that reports the capability as absent.
pub struct UnsupportedBackend;

#[async_trait]
impl SpeechBackend for UnsupportedBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>, CaptureError> {
        Err(CaptureError::Unsupported)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "unsupported"
    }
}

pub fn test_track(meat: &str) -> Track {
    Track {
        hook: "Well,".to_string(),
        meat: meat.to_string(),
        close: "Does that answer it?".to_string(),
        confidence: 80,
    }
}

pub fn test_bundle(meat: &str, pace: &str) -> SuggestionBundle {
    SuggestionBundle {
        neutral: test_track(meat),
        confident: test_track(meat),
        technical: test_track(meat),
        keywords: vec!["React".to_string()],
        pace: pace.to_string(),
        tone: "Confident".to_string(),
        seq: 0,
    }
}

/// Generation client that records every request and answers immediately.
/// Pace values are handed out front-to-back; the last one repeats.
pub struct RecordingClient {
    pub requests: Arc<StdMutex<Vec<SuggestRequest>>>,
    paces: StdMutex<VecDeque<String>>,
    fallback_pace: String,
}

impl RecordingClient {
    pub fn new(pace: &str) -> Self {
        Self {
            requests: Arc::new(StdMutex::new(Vec::new())),
            paces: StdMutex::new(VecDeque::new()),
            fallback_pace: pace.to_string(),
        }
    }

    pub fn with_paces(paces: &[&str]) -> Self {
        let client = Self::new(paces.last().copied().unwrap_or("140"));
        *client.paces.lock().unwrap() = paces.iter().map(|p| p.to_string()).collect();
        client
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SuggestClient for RecordingClient {
    async fn suggest(&self, request: &SuggestRequest) -> Result<SuggestionBundle, SuggestError> {
        self.requests.lock().unwrap().push(request.clone());
        let pace = self
            .paces
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback_pace.clone());
        let count = self.requests.lock().unwrap().len();
        Ok(test_bundle(&format!("answer {}", count), &pace))
    }
}

/// Generation client that blocks each request until the test sends a permit
/// on the release sender. Makes in-flight windows deterministic.
pub struct GatedClient {
    pub requests: Arc<StdMutex<Vec<SuggestRequest>>>,
    gate: Mutex<mpsc::Receiver<()>>,
}

impl GatedClient {
    pub fn new() -> (Self, mpsc::Sender<()>) {
        let (release, gate) = mpsc::channel(16);
        let client = Self {
            requests: Arc::new(StdMutex::new(Vec::new())),
            gate: Mutex::new(gate),
        };
        (client, release)
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SuggestClient for GatedClient {
    async fn suggest(&self, request: &SuggestRequest) -> Result<SuggestionBundle, SuggestError> {
        self.requests.lock().unwrap().push(request.clone());
        self.gate.lock().await.recv().await;
        let count = self.requests.lock().unwrap().len();
        Ok(test_bundle(&format!("answer {}", count), "140"))
    }
}

/// Clipboard with a fixed 2x2 image.
pub struct FakeClipboard;

impl ClipboardSource for FakeClipboard {
    fn read_image(&self) -> Result<ClipboardImage, VisionError> {
        Ok(ClipboardImage {
            width: 2,
            height: 2,
            rgba: vec![
                255, 0, 0, 255, 255, 0, 0, 255, //
                255, 0, 0, 255, 255, 0, 0, 255,
            ],
        })
    }
}

/// Clipboard with nothing usable on it.
pub struct EmptyClipboard;

impl ClipboardSource for EmptyClipboard {
    fn read_image(&self) -> Result<ClipboardImage, VisionError> {
        Err(VisionError::NoImage)
    }
}
