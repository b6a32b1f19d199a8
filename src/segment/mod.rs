//! Utterance segmentation and trigger policy.
//!
//! Decides when accumulated speech constitutes a complete turn worth sending
//! for suggestions. Two policies exist, modelling the two capture variants:
//! a silence debounce (fixed quiet interval restarted on every transcript
//! growth) and a growth threshold (dispatch as soon as enough new text has
//! accumulated since the last dispatch). Exactly one policy is active per
//! session; running both against the same transcript double-dispatches.
//!
//! The `Segmenter` is a pure state machine. The session event loop feeds it
//! growth notifications and sleeps on the deadline it exposes, so all timer
//! state lives in one place and cancellation on stop/reset is structural.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_SILENCE_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_GROWTH_THRESHOLD: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    /// Fire after a fixed quiet interval with no transcript growth
    SilenceDebounce,
    /// Fire as soon as growth since the last dispatch exceeds a threshold
    GrowthThreshold,
}

#[derive(Debug, Clone)]
pub struct SegmentationConfig {
    pub policy: TriggerPolicy,
    /// Quiet interval for the silence policy
    pub silence_delay: Duration,
    /// Characters of growth for the growth policy
    pub growth_threshold: usize,
    /// Auto-turn-taking variant: stop the capture engine once silence fires
    pub stop_on_silence: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            policy: TriggerPolicy::GrowthThreshold,
            silence_delay: DEFAULT_SILENCE_DELAY,
            growth_threshold: DEFAULT_GROWTH_THRESHOLD,
            stop_on_silence: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    Dispatch,
    Wait,
}

/// Trigger-policy state machine.
///
/// Tracks the pending silence deadline (at most one) and the transcript
/// length high-water mark at the last dispatched suggestion request.
#[derive(Debug)]
pub struct Segmenter {
    config: SegmentationConfig,
    last_dispatched_len: usize,
    deadline: Option<Instant>,
}

impl Segmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self {
            config,
            last_dispatched_len: 0,
            deadline: None,
        }
    }

    /// The committed transcript grew to `len` characters.
    pub fn note_growth(&mut self, len: usize, now: Instant) -> TriggerDecision {
        match self.config.policy {
            TriggerPolicy::SilenceDebounce => {
                // Any growth replaces the pending deadline
                self.deadline = Some(now + self.config.silence_delay);
                TriggerDecision::Wait
            }
            TriggerPolicy::GrowthThreshold => {
                if len.saturating_sub(self.last_dispatched_len) > self.config.growth_threshold {
                    TriggerDecision::Dispatch
                } else {
                    TriggerDecision::Wait
                }
            }
        }
    }

    /// The pending silence deadline, if any. At most one exists.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The silence deadline elapsed with no further growth.
    pub fn on_silence(&mut self) -> TriggerDecision {
        if self.deadline.take().is_some() {
            TriggerDecision::Dispatch
        } else {
            TriggerDecision::Wait
        }
    }

    /// Record that a suggestion request was dispatched for a transcript of
    /// `len` characters.
    pub fn mark_dispatched(&mut self, len: usize) {
        self.last_dispatched_len = len;
    }

    /// Cancel the pending deadline. Called when listening stops.
    pub fn clear(&mut self) {
        self.deadline = None;
    }

    /// Cancel the pending deadline and forget the dispatch high-water mark.
    /// Called when the transcript is reset.
    pub fn reset(&mut self) {
        self.deadline = None;
        self.last_dispatched_len = 0;
    }

    pub fn stop_on_silence(&self) -> bool {
        self.config.stop_on_silence
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }
}
