//! Telephony audio: codec, frames and the ingest queue.

pub mod codec;
pub mod queue;

use std::time::Duration;

use bytes::Bytes;

pub use codec::{CodecError, StreamingEncoder};
pub use queue::{IngestReceiver, IngestSender, ingest_queue};

/// Sample rate shared by the telephony leg and both speech services
pub const SAMPLE_RATE_HZ: u32 = 8000;

/// Mono audio everywhere
pub const CHANNELS: u16 = 1;

/// A chunk of 16-bit little-endian linear PCM at 8kHz mono.
///
/// Frames carry no sequence number; the ingest queue preserves arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pcm: Bytes,
}

impl AudioFrame {
    pub fn from_pcm(pcm: impl Into<Bytes>) -> Self {
        Self { pcm: pcm.into() }
    }

    /// Decode a mu-law wire payload into a frame.
    pub fn from_mulaw(wire: &[u8]) -> Result<Self, CodecError> {
        codec::decode(wire).map(Self::from_pcm)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pcm
    }

    pub fn into_bytes(self) -> Bytes {
        self.pcm
    }

    pub fn sample_count(&self) -> usize {
        self.pcm.len() / codec::PCM_SAMPLE_WIDTH
    }

    pub fn duration(&self) -> Duration {
        Duration::from_micros(self.sample_count() as u64 * 1_000_000 / SAMPLE_RATE_HZ as u64)
    }
}
