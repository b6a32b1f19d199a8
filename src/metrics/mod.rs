//! Pace and session metrics.
//!
//! Derives words-per-minute from the suggestion bundles the backend returns,
//! classifies it into bands, and accumulates the time series used by the
//! end-of-session summary.

use crate::suggest::SuggestionBundle;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Speaking pace bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaceBand {
    Fast,
    Optimal,
    Steady,
}

/// Classify words-per-minute: above 160 is fast, 130-160 inclusive is
/// optimal, everything below is steady.
pub fn classify_wpm(wpm: u32) -> PaceBand {
    if wpm > 160 {
        PaceBand::Fast
    } else if wpm >= 130 {
        PaceBand::Optimal
    } else {
        PaceBand::Steady
    }
}

/// Extract the digits of a pace field and parse them as WPM.
///
/// The backend reports pace as free-form text ("135 wpm", "about 120");
/// anything without digits yields None.
pub fn parse_pace(pace: &str) -> Option<u32> {
    let digits: String = pace.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Whitespace token count of a transcript
pub fn word_count(transcript: &str) -> usize {
    transcript.split_whitespace().count()
}

/// Arithmetic mean of the pace history, rounded to the nearest integer.
/// Zero when the history is empty.
pub fn average_pace(history: &[u32]) -> u32 {
    if history.is_empty() {
        return 0;
    }
    let sum: u64 = history.iter().map(|&w| w as u64).sum();
    ((sum as f64) / (history.len() as f64)).round() as u32
}

/// Accumulates pace samples over a session.
///
/// One sample is appended per suggestion bundle applied while the session is
/// listening; samples are never mutated after append. Bundles whose pace
/// field has no digits are ignored.
#[derive(Debug, Default)]
pub struct PaceTracker {
    history: Vec<u32>,
    current: Option<(u32, PaceBand)>,
}

impl PaceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe an applied bundle. Returns the band when the pace parsed.
    pub fn observe(&mut self, bundle: &SuggestionBundle) -> Option<PaceBand> {
        let wpm = bundle.pace_numeric()?;
        let band = classify_wpm(wpm);
        self.history.push(wpm);
        self.current = Some((wpm, band));
        Some(band)
    }

    pub fn history(&self) -> &[u32] {
        &self.history
    }

    pub fn current_wpm(&self) -> Option<u32> {
        self.current.map(|(wpm, _)| wpm)
    }

    pub fn current_band(&self) -> Option<PaceBand> {
        self.current.map(|(_, band)| band)
    }

    pub fn average(&self) -> u32 {
        average_pace(&self.history)
    }
}

/// Monotonic 1-second session duration ticker.
///
/// Runs until stopped; the session stops it exactly once, when the user ends
/// the session.
pub struct SessionClock {
    seconds: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            seconds: Arc::new(AtomicU64::new(0)),
            handle: None,
        }
    }

    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }

        let seconds = Arc::clone(&self.seconds);
        self.handle = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + Duration::from_secs(1);
            let mut tick = tokio::time::interval_at(start, Duration::from_secs(1));
            loop {
                tick.tick().await;
                seconds.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }

    pub fn seconds(&self) -> u64 {
        self.seconds.load(Ordering::SeqCst)
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        self.stop();
    }
}
