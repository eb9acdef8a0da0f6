//! Caller and bot speaking state
//!
//! Caller speech is inferred from the rhythm of transcript events rather than
//! engine-side voice activity detection: interim results arrive in quick
//! bursts only while someone is talking, so a short burst marks speech onset
//! and a final result marks its end.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::core::stt::TranscriptEvent;

/// Burst detection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeakingDetectionConfig {
    /// Events needed within the reset window to flag speech onset
    pub threshold: u32,
    /// A gap longer than this restarts the burst count
    pub reset_window: Duration,
}

impl Default for SpeakingDetectionConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            reset_window: Duration::from_millis(500),
        }
    }
}

/// One party's speaking flag and when it last turned on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpeakerActivity {
    speaking: bool,
    since: Option<Instant>,
}

impl SpeakerActivity {
    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn since(&self) -> Option<Instant> {
        self.since
    }

    /// Returns false when already speaking
    pub fn begin(&mut self, now: Instant) -> bool {
        if self.speaking {
            return false;
        }
        self.speaking = true;
        self.since = Some(now);
        true
    }

    /// Clear the flag, returning how long it was set if a start was recorded
    pub fn end(&mut self, now: Instant) -> Option<Duration> {
        self.speaking = false;
        self.since
            .take()
            .map(|start| now.saturating_duration_since(start))
    }
}

/// Snapshot of both parties, for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpeakingState {
    pub caller_speaking: bool,
    pub bot_speaking: bool,
}

impl fmt::Display for SpeakingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = |speaking: bool| if speaking { "SPEAKING" } else { "silent" };
        write!(
            f,
            "Bot: {}, Caller: {}",
            label(self.bot_speaking),
            label(self.caller_speaking)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerTransition {
    Started,
    Stopped { duration: Option<Duration> },
}

/// Caller-side speaking detector
#[derive(Debug)]
pub struct SpeakingStateTracker {
    config: SpeakingDetectionConfig,
    burst_count: u32,
    last_event: Option<Instant>,
    caller: SpeakerActivity,
}

impl SpeakingStateTracker {
    pub fn new(config: SpeakingDetectionConfig) -> Self {
        if config.threshold == 0 {
            warn!("Speaking threshold of 0 treated as 1");
        }
        Self {
            config: SpeakingDetectionConfig {
                threshold: config.threshold.max(1),
                ..config
            },
            burst_count: 0,
            last_event: None,
            caller: SpeakerActivity::default(),
        }
    }

    pub fn caller(&self) -> &SpeakerActivity {
        &self.caller
    }

    pub fn is_caller_speaking(&self) -> bool {
        self.caller.is_speaking()
    }

    pub fn burst_count(&self) -> u32 {
        self.burst_count
    }

    /// Feed one transcript event, timed by when it arrived from upstream.
    pub fn observe(&mut self, event: &TranscriptEvent) -> Option<CallerTransition> {
        self.observe_at(event, event.received_at)
    }

    /// Feed one transcript event received at `now`.
    pub fn observe_at(&mut self, event: &TranscriptEvent, now: Instant) -> Option<CallerTransition> {
        let gap_exceeded = self
            .last_event
            .is_some_and(|previous| now.saturating_duration_since(previous) > self.config.reset_window);
        self.last_event = Some(now);

        if event.is_final {
            self.burst_count = 0;
            if !self.caller.is_speaking() {
                return None;
            }
            let duration = self.caller.end(now);
            match duration {
                Some(d) => info!(duration_ms = d.as_millis() as u64, "Caller stopped speaking"),
                None => info!("Caller stopped speaking"),
            }
            return Some(CallerTransition::Stopped { duration });
        }

        if gap_exceeded {
            self.burst_count = 0;
        }
        self.burst_count += 1;

        if self.burst_count >= self.config.threshold && self.caller.begin(now) {
            info!(burst = self.burst_count, "Caller started speaking");
            return Some(CallerTransition::Started);
        }
        None
    }
}
