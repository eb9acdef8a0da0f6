use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::core::audio::SAMPLE_RATE_HZ;

/// Errors raised by the speech synthesis boundary
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TTSError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Timed out waiting for audio after {0:?}")]
    Timeout(std::time::Duration),
}

pub type TTSResult<T> = Result<T, TTSError>;

/// One "speak this text" request
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub language_code: String,
    pub voice_name: String,
    pub sample_rate_hz: u32,
}

impl SynthesisRequest {
    pub fn new(
        text: impl Into<String>,
        language_code: impl Into<String>,
        voice_name: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            language_code: language_code.into(),
            voice_name: voice_name.into(),
            sample_rate_hz: SAMPLE_RATE_HZ,
        }
    }
}

/// Raw 16-bit little-endian PCM chunks at the requested sample rate
pub type AudioChunkStream = BoxStream<'static, TTSResult<Bytes>>;

/// Streaming speech synthesis boundary.
///
/// Dropping the returned stream must abandon the upstream request.
#[async_trait]
pub trait SynthesisService: Send + Sync {
    async fn synthesize(&self, request: SynthesisRequest) -> TTSResult<AudioChunkStream>;

    /// Provider name for logging
    fn provider_name(&self) -> &'static str;
}
