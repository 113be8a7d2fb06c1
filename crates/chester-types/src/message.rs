use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role in a completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message sent to or received from the completion service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    User,
    Assistant,
}

impl Origin {
    pub fn is_from_ai(self) -> bool {
        matches!(self, Origin::Assistant)
    }
}

/// A persisted row of `chat_messages`. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(deserialize_with = "crate::de::id")]
    pub id: String,
    pub user_id: String,
    #[serde(deserialize_with = "crate::de::id")]
    pub session_id: String,
    pub content: String,
    #[serde(default, deserialize_with = "crate::de::flag")]
    pub is_from_ai: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn origin(&self) -> Origin {
        if self.is_from_ai {
            Origin::Assistant
        } else {
            Origin::User
        }
    }
}

/// Insert payload for `chat_messages`; the gateway assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct NewChatMessage {
    pub user_id: String,
    pub session_id: String,
    pub content: String,
    pub is_from_ai: bool,
    pub created_at: DateTime<Utc>,
}

impl NewChatMessage {
    pub fn new(
        user_id: &str,
        session_id: &str,
        origin: Origin,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            content: content.into(),
            is_from_ai: origin.is_from_ai(),
            created_at,
        }
    }
}
