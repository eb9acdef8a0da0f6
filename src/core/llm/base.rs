use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the language model boundary
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LLMError {
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Model endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Request timed out")]
    Timeout,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Response contained no completion")]
    EmptyResponse,
}

pub type LLMResult<T> = Result<T, LLMError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A role-tagged message as sent to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request/response chat completion boundary.
///
/// Sampling parameters belong to the implementation's configuration; callers
/// only supply the messages.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> LLMResult<String>;

    fn model_name(&self) -> &str;
}
