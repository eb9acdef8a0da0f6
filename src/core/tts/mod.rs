mod base;
pub mod riva;
pub mod streamer;
pub mod voices;

pub use base::{AudioChunkStream, SynthesisRequest, SynthesisService, TTSError, TTSResult};
pub use riva::RivaSpeechSynthesizer;
pub use streamer::{
    ResponseSynthesisStreamer, StreamerConfig, SynthesisOutcome, SynthesisStatus, SynthesisTask,
};
pub use voices::{Voice, available_voices, is_voice_available, supported_languages};
