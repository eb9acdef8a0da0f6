//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `twiml` - Call answer webhook returning TwiML
//! - `voices` - Voice catalogue listing
//! - `media_stream` - Twilio media stream WebSocket

pub mod api;
pub mod media_stream;
pub mod twiml;
pub mod voices;

pub use media_stream::media_stream_handler;
