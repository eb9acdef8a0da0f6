//! G.711 mu-law codec
//!
//! Telephony media streams carry 8-bit mu-law samples at 8kHz. The speech
//! services consume and produce 16-bit little-endian linear PCM at the same
//! rate, so every inbound frame is expanded and every outbound chunk is
//! compressed here. Both directions are pure table-free bit manipulation.

use thiserror::Error;

/// Bias added to the magnitude before segment lookup (G.711)
const BIAS: i32 = 0x84;

/// Largest magnitude that survives the bias without overflowing 15 bits
const CLIP: i32 = 32635;

/// Bytes per 16-bit PCM sample
pub const PCM_SAMPLE_WIDTH: usize = 2;

/// Errors raised for malformed codec input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("PCM buffer has odd length {0}, expected whole 16-bit samples")]
    OddLength(usize),
    #[error("Empty audio buffer")]
    Empty,
}

/// Expand one mu-law byte into a linear 16-bit sample.
#[inline]
pub fn mulaw_to_linear(byte: u8) -> i16 {
    let byte = !byte;
    let exponent = ((byte >> 4) & 0x07) as i32;
    let mantissa = (byte & 0x0F) as i32;
    let magnitude = (((mantissa << 3) + BIAS) << exponent) - BIAS;

    if byte & 0x80 != 0 {
        -magnitude as i16
    } else {
        magnitude as i16
    }
}

/// Compress one linear 16-bit sample into a mu-law byte.
#[inline]
pub fn linear_to_mulaw(sample: i16) -> u8 {
    let mut magnitude = sample as i32;
    let sign = if magnitude < 0 {
        magnitude = -magnitude;
        0x80
    } else {
        0x00
    };

    magnitude = magnitude.min(CLIP) + BIAS;

    // Highest set bit lies in 7..=14 after biasing
    let exponent = (31 - (magnitude as u32).leading_zeros() as i32) - 7;
    let mantissa = (magnitude >> (exponent + 3)) & 0x0F;

    !(sign | (exponent << 4) as u8 | mantissa as u8)
}

/// Decode a mu-law wire payload into little-endian PCM16 bytes.
///
/// An empty payload is rejected so the caller can drop the frame.
pub fn decode(wire: &[u8]) -> Result<Vec<u8>, CodecError> {
    if wire.is_empty() {
        return Err(CodecError::Empty);
    }

    let mut pcm = Vec::with_capacity(wire.len() * PCM_SAMPLE_WIDTH);
    for &byte in wire {
        pcm.extend_from_slice(&mulaw_to_linear(byte).to_le_bytes());
    }
    Ok(pcm)
}

/// Encode little-endian PCM16 bytes into a mu-law wire payload.
pub fn encode(pcm: &[u8]) -> Result<Vec<u8>, CodecError> {
    if pcm.is_empty() {
        return Err(CodecError::Empty);
    }
    if pcm.len() % PCM_SAMPLE_WIDTH != 0 {
        return Err(CodecError::OddLength(pcm.len()));
    }

    Ok(pcm
        .chunks_exact(PCM_SAMPLE_WIDTH)
        .map(|pair| linear_to_mulaw(i16::from_le_bytes([pair[0], pair[1]])))
        .collect())
}

/// Incremental PCM16 to mu-law encoder.
///
/// Synthesis chunks are not guaranteed to end on a sample boundary; a
/// dangling byte is held back and prefixed to the next chunk.
#[derive(Debug, Default)]
pub struct StreamingEncoder {
    carry: Option<u8>,
}

impl StreamingEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode as many whole samples as are available.
    ///
    /// Returns an empty vector when the chunk (plus carry) holds no whole sample.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<u8> {
        let mut joined;
        let mut data = chunk;
        if let Some(prev) = self.carry.take() {
            joined = Vec::with_capacity(chunk.len() + 1);
            joined.push(prev);
            joined.extend_from_slice(chunk);
            data = &joined;
        }

        if data.len() % PCM_SAMPLE_WIDTH != 0 {
            self.carry = data.last().copied();
            data = &data[..data.len() - 1];
        }

        data.chunks_exact(PCM_SAMPLE_WIDTH)
            .map(|pair| linear_to_mulaw(i16::from_le_bytes([pair[0], pair[1]])))
            .collect()
    }

    /// Whether a partial sample is still pending
    pub fn has_pending(&self) -> bool {
        self.carry.is_some()
    }
}
