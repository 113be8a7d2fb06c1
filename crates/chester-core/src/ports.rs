//! Port traits at the hexagonal architecture boundary.
//!
//! These traits are defined here in `chester-core` (pure Rust).
//! Implementations live in `chester-platform` (HTTP and in-memory adapters).
//! The core never imports platform code; it only depends on these traits.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use chester_types::{
    ChesterError, Result,
    message::Message,
    user::UserIdentity,
};
use crate::query::{Filter, Query};

/// A table row as exchanged with the data gateway (a JSON object).
pub type Row = Value;

/// Tables the client reads and writes.
pub mod tables {
    pub const CHAT_SESSIONS: &str = "chat_sessions";
    pub const CHAT_MESSAGES: &str = "chat_messages";
    pub const JOURNAL_ENTRIES: &str = "journal_entries";
    pub const COMMUNITY_ENTRIES: &str = "community_entries";
}

/// Server-side procedures.
pub mod procedures {
    /// Atomically adds one to `community_entries.supports`. Takes `{ "post_id": id }`.
    pub const INCREMENT_SUPPORTS: &str = "increment_supports";
}

// ─── Data Port ───────────────────────────────────────────────

/// Remote tables. Row ownership is enforced by the backend; callers still
/// scope every query to the acting user.
#[async_trait(?Send)]
pub trait DataPort {
    /// Insert rows and return them as stored (with server-assigned ids)
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>>;

    /// Apply `patch` to every row matching `filter`; returns the affected rows
    async fn update(&self, table: &str, patch: Row, filter: &Filter) -> Result<Vec<Row>>;

    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>>;

    /// Delete every row matching `filter`
    async fn delete(&self, table: &str, filter: &Filter) -> Result<()>;

    /// Call a stored procedure
    async fn rpc(&self, procedure: &str, args: Value) -> Result<Value>;

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Auth Port ───────────────────────────────────────────────

#[async_trait(?Send)]
pub trait AuthPort {
    /// The signed-in user, if any
    async fn current_user(&self) -> Result<Option<UserIdentity>>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity>;

    async fn sign_out(&self) -> Result<()>;
}

// ─── Completion Port ─────────────────────────────────────────

/// Request to send to the completion service. Model and credentials
/// belong to the adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Complete (non-streaming) response from the completion service
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub message: Message,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait(?Send)]
pub trait CompletionPort {
    async fn chat_completion(&self, req: ChatRequest) -> Result<ChatResponse>;

    /// One system prompt plus one user turn in, one assistant reply out.
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String> {
        let req = ChatRequest::new(vec![
            Message::system(system_prompt),
            Message::user(user_message),
        ]);
        let reply = self.chat_completion(req).await?.message.content;
        if reply.trim().is_empty() {
            return Err(ChesterError::Completion("empty reply".to_string()));
        }
        Ok(reply)
    }
}

// ─── Row helpers ─────────────────────────────────────────────

pub(crate) fn to_row<T: Serialize>(value: &T) -> Result<Row> {
    Ok(serde_json::to_value(value)?)
}

pub(crate) fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(ChesterError::from))
        .collect()
}

pub(crate) fn first_row<T: DeserializeOwned>(rows: Vec<Row>, what: &str) -> Result<T> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| ChesterError::Gateway(format!("{} returned no rows", what)))?;
    Ok(serde_json::from_value(row)?)
}
