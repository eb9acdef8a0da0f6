//! Twilio media stream sessions
//!
//! - `protocol` - Wire messages exchanged with the telephony leg
//! - `controller` - Lifecycle of one call from `start` to teardown

pub mod controller;
pub mod protocol;

pub use controller::{SessionController, SessionServices, SessionSettings};
pub use protocol::{BotMarker, InboundMessage, OutboundMessage, OutboundRoute};
