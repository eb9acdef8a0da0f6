use async_trait::async_trait;
use futures::stream::BoxStream;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::core::audio::{AudioFrame, CHANNELS, SAMPLE_RATE_HZ};

/// Errors raised by the streaming transcription boundary
#[derive(Debug, Error, Clone, PartialEq)]
pub enum STTError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
}

pub type STTResult<T> = Result<T, STTError>;

/// Streaming session configuration sent once when the upstream call opens
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionSettings {
    pub language_code: String,
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub max_alternatives: u32,
    pub interim_results: bool,
    pub automatic_punctuation: bool,
    pub word_time_offsets: bool,
}

impl RecognitionSettings {
    /// Telephony defaults: 8kHz mono PCM with interim results and punctuation.
    pub fn telephony(language_code: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
            sample_rate_hz: SAMPLE_RATE_HZ,
            channels: CHANNELS,
            max_alternatives: 1,
            interim_results: true,
            automatic_punctuation: true,
            word_time_offsets: true,
        }
    }
}

/// One candidate transcription
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionAlternative {
    pub transcript: String,
    pub confidence: f32,
}

/// One upstream result; alternatives are ordered best first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecognitionResult {
    pub is_final: bool,
    pub alternatives: Vec<RecognitionAlternative>,
}

/// A response message from the upstream service
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecognitionBatch {
    pub results: Vec<RecognitionResult>,
}

/// Transcript event handed to the dialog layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEvent {
    pub is_final: bool,
    pub text: String,
    pub confidence: f32,
    /// When the result arrived from upstream. Speech onset is timed from
    /// this, not from when the dialog gets round to reading the event.
    #[serde(skip)]
    pub received_at: Instant,
}

impl TranscriptEvent {
    pub fn interim(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            is_final: false,
            text: text.into(),
            confidence,
            received_at: clock_now(),
        }
    }

    pub fn final_result(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            is_final: true,
            text: text.into(),
            confidence,
            received_at: clock_now(),
        }
    }

    pub fn with_received_at(mut self, received_at: Instant) -> Self {
        self.received_at = received_at;
        self
    }
}

/// Current time on the runtime clock, so a paused test clock applies.
pub fn clock_now() -> Instant {
    tokio::time::Instant::now().into_std()
}

impl From<&RecognitionResult> for TranscriptEvent {
    /// Keep only the top alternative; missing values fall back to "" and 0.0.
    fn from(result: &RecognitionResult) -> Self {
        let top = result.alternatives.first();
        Self {
            is_final: result.is_final,
            text: top.map(|alt| alt.transcript.clone()).unwrap_or_default(),
            confidence: top.map(|alt| alt.confidence).unwrap_or(0.0),
            received_at: clock_now(),
        }
    }
}

pub type AudioFrameStream = BoxStream<'static, AudioFrame>;
pub type RecognitionStream = BoxStream<'static, STTResult<RecognitionBatch>>;

/// Streaming speech recognition boundary.
///
/// Implementations open one upstream call per invocation. The call must end
/// gracefully once `audio` is exhausted, after flushing any pending results.
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn streaming_recognize(
        &self,
        settings: RecognitionSettings,
        audio: AudioFrameStream,
    ) -> STTResult<RecognitionStream>;

    /// Provider name for logging
    fn provider_name(&self) -> &'static str;
}
