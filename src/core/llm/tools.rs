//! Tool calls embedded in model replies
//!
//! The model requests a local action by embedding one tag in its free text:
//!
//! ```text
//! <function=process_pizza_order>{"size": "medium", "toppings": ["cheese"], "crust": "thin"}</function>
//! ```
//!
//! [`parse_reply`] classifies a reply as plain text or a tool call.
//! [`ToolRegistry::resolve`] runs the tool and produces the text to speak.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::fallback;

const OPEN_TAG: &str = "<function=";

static TOOL_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<function=([^>]*)>(.*?)</function>").expect("tool call pattern is valid")
});

/// A reply split into its tagged variant
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyContent {
    PlainText(String),
    ToolCall(ToolCall),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    /// Raw JSON argument text, not yet validated
    pub args_json: String,
    /// Reply text with the tag removed
    pub surrounding_text: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ToolTagError {
    #[error("Tool call tag is not terminated")]
    Unterminated,
    #[error("Tool call tag has no function name")]
    MissingName,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ToolError {
    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),
}

/// Classify a model reply.
///
/// Only the first tag is honoured; later tags stay in the surrounding text.
pub fn parse_reply(raw: &str) -> Result<ReplyContent, ToolTagError> {
    let Some(captures) = TOOL_CALL.captures(raw) else {
        if raw.contains(OPEN_TAG) {
            return Err(ToolTagError::Unterminated);
        }
        return Ok(ReplyContent::PlainText(raw.trim().to_string()));
    };

    let name = captures.get(1).map_or("", |m| m.as_str()).trim();
    if name.is_empty() {
        return Err(ToolTagError::MissingName);
    }
    let args_json = captures.get(2).map_or("", |m| m.as_str()).trim();

    let stripped = TOOL_CALL.replacen(raw, 1, " ");
    let surrounding_text = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    Ok(ReplyContent::ToolCall(ToolCall {
        name: name.to_string(),
        args_json: args_json.to_string(),
        surrounding_text,
    }))
}

/// A local function the model may call
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// JSON schema advertised to the model in the system prompt
    fn definition(&self) -> Value;

    /// Execute the tool and return the sentence to speak
    fn invoke(&self, args: Value) -> Result<String, ToolError>;
}

/// The text to speak for a reply, plus which tool produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReply {
    pub text: String,
    pub tool: Option<String>,
}

impl ResolvedReply {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool: None,
        }
    }
}

#[derive(Default, Clone)]
pub struct ToolRegistry {
    handlers: HashMap<&'static str, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(handler.name(), handler);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.handlers.get(name)
    }

    /// Tool definitions sorted by name
    pub fn definitions(&self) -> Vec<Value> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
            .into_iter()
            .filter_map(|name| self.handlers.get(name).map(|h| h.definition()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Turn a raw model reply into the text to speak.
    ///
    /// Never fails: malformed tags and arguments degrade to an apology.
    pub fn resolve(&self, raw: &str) -> ResolvedReply {
        let call = match parse_reply(raw) {
            Ok(ReplyContent::PlainText(text)) if text.is_empty() => {
                warn!("Model returned an empty reply");
                return ResolvedReply::plain(fallback::EMPTY_RESPONSE);
            }
            Ok(ReplyContent::PlainText(text)) => return ResolvedReply::plain(text),
            Ok(ReplyContent::ToolCall(call)) => call,
            Err(e) => {
                warn!(reply = %raw, "Malformed tool call tag: {}", e);
                return ResolvedReply::plain(fallback::MALFORMED_TOOL_CALL);
            }
        };

        debug!(tool = %call.name, args = %call.args_json, "Tool call detected");

        let Some(handler) = self.get(&call.name) else {
            warn!(tool = %call.name, "Model called an unknown tool");
            if call.surrounding_text.is_empty() {
                return ResolvedReply::plain(fallback::MALFORMED_TOOL_CALL);
            }
            return ResolvedReply::plain(call.surrounding_text);
        };

        let args: Value = match serde_json::from_str(&call.args_json) {
            Ok(args) => args,
            Err(e) => {
                warn!(tool = %call.name, args = %call.args_json, "Tool arguments are not valid JSON: {}", e);
                return ResolvedReply::plain(fallback::MALFORMED_TOOL_CALL);
            }
        };

        match handler.invoke(args) {
            Ok(spoken) => {
                info!(tool = %call.name, "Tool call executed");
                ResolvedReply {
                    text: spoken,
                    tool: Some(call.name),
                }
            }
            Err(e) => {
                warn!(tool = %call.name, "Tool call failed: {}", e);
                ResolvedReply {
                    text: fallback::MALFORMED_TOOL_CALL.to_string(),
                    tool: Some(call.name),
                }
            }
        }
    }
}
