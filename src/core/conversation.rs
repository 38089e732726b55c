use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier assigned by a store when a conversation is created.
///
/// Relational stores hand out auto-increment integers, the document store
/// hands out 24-digit hex object ids. Callers only ever compare and echo it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for ConversationId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// One exchange: the user's utterance and the two provider responses that
/// were kept for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub user_input: String,
    pub response_a: String,
    pub response_b: String,
}

impl Turn {
    pub fn new(
        user_input: impl Into<String>,
        response_a: impl Into<String>,
        response_b: impl Into<String>,
    ) -> Self {
        Self {
            user_input: user_input.into(),
            response_a: response_a.into(),
            response_b: response_b.into(),
        }
    }
}

/// Placeholder shown in history lists for a conversation without turns.
pub const EMPTY_CONVERSATION_PREVIEW: &str = "[No messages in chat]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    pub turns: Vec<Turn>,
}

impl Conversation {
    pub fn new(id: ConversationId, turns: Vec<Turn>) -> Self {
        Self { id, turns }
    }

    /// Sidebar label: the first user input, or a placeholder.
    pub fn preview(&self) -> &str {
        self.turns
            .first()
            .map(|turn| turn.user_input.as_str())
            .unwrap_or(EMPTY_CONVERSATION_PREVIEW)
    }
}
