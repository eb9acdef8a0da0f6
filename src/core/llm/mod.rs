mod base;
pub mod nim;
pub mod pizza;
pub mod prompt;
pub mod tools;

pub use base::{ChatMessage, ChatRole, LLMError, LLMResult, LanguageModel};
pub use nim::{NimChatClient, NimConfig, SamplingParams};
pub use pizza::PizzaOrderTool;
pub use tools::{ReplyContent, ResolvedReply, ToolCall, ToolHandler, ToolRegistry, parse_reply};

/// Canned replies spoken when a turn cannot produce a real answer
pub mod fallback {
    use super::LLMError;

    /// The model endpoint could not be reached or refused the request
    pub const MODEL_UNAVAILABLE: &str =
        "I'm sorry, I'm having trouble processing your request right now.";

    /// The model answered without usable text
    pub const EMPTY_RESPONSE: &str =
        "I'm sorry, I couldn't generate a response. Could you please try again?";

    /// A tool call could not be parsed or executed
    pub const MALFORMED_TOOL_CALL: &str = "I apologize, but I'm having trouble processing your order. Could you please repeat your pizza preferences?";

    /// Apology for a failed model call
    pub fn for_error(error: &LLMError) -> &'static str {
        match error {
            LLMError::EmptyResponse | LLMError::InvalidResponse(_) => EMPTY_RESPONSE,
            LLMError::RequestFailed(_) | LLMError::Status { .. } | LLMError::Timeout => {
                MODEL_UNAVAILABLE
            }
        }
    }
}
