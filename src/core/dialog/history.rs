use crate::core::llm::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
}

/// Append-only conversation log for one call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(ConversationTurn {
            role: TurnRole::User,
            text: text.into(),
        });
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.turns.push(ConversationTurn {
            role: TurnRole::Assistant,
            text: text.into(),
        });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Model input: the system prompt followed by every turn in order.
    pub fn to_messages(&self, system_prompt: &str) -> Vec<ChatMessage> {
        std::iter::once(ChatMessage::system(system_prompt))
            .chain(self.turns.iter().map(|turn| match turn.role {
                TurnRole::User => ChatMessage::user(turn.text.clone()),
                TurnRole::Assistant => ChatMessage::assistant(turn.text.clone()),
            }))
            .collect()
    }
}
