//! Conversation turn management for one call
//!
//! - `history` - Per-call conversation log fed to the language model
//! - `orchestrator` - IDLE / AWAITING_RESPONSE / SPEAKING state machine with barge-in

mod history;
mod orchestrator;

pub use history::{ConversationHistory, ConversationTurn, TurnRole};
pub use orchestrator::{
    DialogCommand, DialogConfig, DialogOrchestrator, DialogSummary, TurnState,
};
