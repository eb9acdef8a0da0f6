//! Twilio media stream WebSocket
//!
//! One socket carries one call: JSON text frames in both directions, tagged
//! by their `event` field.

mod handler;

pub use handler::media_stream_handler;
