use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted row of `chat_sessions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    #[serde(deserialize_with = "crate::de::id")]
    pub id: String,
    pub user_id: String,
    /// Unset until the first message is saved
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl ChatSession {
    pub fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Insert payload for `chat_sessions`; the gateway assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct NewChatSession {
    pub user_id: String,
    pub title: Option<String>,
    pub mood: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Summary of a session for listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session: ChatSession,
    /// Content of the latest message by creation time
    pub preview: String,
    pub message_count: usize,
}
