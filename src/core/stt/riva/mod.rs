//! NVIDIA Riva streaming speech recognition
//!
//! ```protobuf
//! service RivaSpeechRecognition {
//!     rpc StreamingRecognize(stream StreamingRecognizeRequest)
//!         returns (stream StreamingRecognizeResponse);
//! }
//! ```
//!
//! The first request carries the streaming configuration, every later request
//! one PCM frame. Closing the request stream ends the call once the server has
//! flushed its remaining results.

mod client;
pub mod messages;

pub use client::{RivaSpeechRecognizer, grpc_status_to_stt_error};
