//! NVIDIA Riva online speech synthesis
//!
//! ```protobuf
//! service RivaSpeechSynthesis {
//!     rpc SynthesizeOnline(SynthesizeSpeechRequest)
//!         returns (stream SynthesizeSpeechResponse);
//! }
//! ```

mod client;
pub mod messages;

pub use client::{RivaSpeechSynthesizer, grpc_status_to_tts_error};
