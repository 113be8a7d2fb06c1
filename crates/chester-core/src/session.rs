//! Session manager for chat session rows and their messages.
//!
//! Owns everything that touches `chat_sessions` and `chat_messages`:
//! lazy creation, the paired message insert, metadata bumps, listing
//! with cleanup of abandoned sessions, and cascading deletion.
//! The per-conversation state machine lives in `conversation`.

use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use chester_types::{
    ChesterError, Result,
    config::ChatConfig,
    event::ChatEvent,
    message::{ChatMessage, NewChatMessage, Origin},
    session::{ChatSession, NewChatSession, SessionSummary},
    user::UserIdentity,
};
use crate::clock::MonotonicClock;
use crate::conversation::{Conversation, TranscriptEntry};
use crate::event_bus::EventBus;
use crate::ports::{self, tables, CompletionPort, DataPort};
use crate::query::{Filter, Order, Query};

const MAX_GRACE_SECS: u64 = 365 * 24 * 60 * 60;

/// Shared handle to the chat backends. Clone-cheap via Rc.
#[derive(Clone)]
pub struct SessionManager {
    data: Rc<dyn DataPort>,
    completion: Rc<dyn CompletionPort>,
    config: Rc<ChatConfig>,
    clock: Rc<MonotonicClock>,
    event_bus: EventBus,
}

impl SessionManager {
    pub fn new(
        data: Rc<dyn DataPort>,
        completion: Rc<dyn CompletionPort>,
        config: ChatConfig,
        event_bus: EventBus,
    ) -> Self {
        Self {
            data,
            completion,
            config: Rc::new(config),
            clock: Rc::new(MonotonicClock::new()),
            event_bus,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// A fresh conversation with no backing session. Nothing is written
    /// until the first successful send.
    pub fn open_conversation(&self) -> Conversation {
        Conversation::new(self.clone())
    }

    /// Reopen an existing session with its stored transcript.
    pub async fn resume_conversation(
        &self,
        user: &UserIdentity,
        session_id: &str,
    ) -> Result<Conversation> {
        let session = self.get_session(user, session_id).await?;
        let messages = self.load_messages(user, session_id).await?;
        let transcript = messages
            .into_iter()
            .map(|m| TranscriptEntry::saved(m.origin(), m.content))
            .collect();
        Ok(Conversation::resumed(self.clone(), session, transcript))
    }

    pub async fn get_session(&self, user: &UserIdentity, session_id: &str) -> Result<ChatSession> {
        let query = Query::new()
            .filter(Filter::new().eq("id", session_id).eq("user_id", user.id.as_str()))
            .limit(1);
        let rows = self.data.select(tables::CHAT_SESSIONS, &query).await?;
        ports::from_rows::<ChatSession>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| ChesterError::NotFound(format!("chat session {}", session_id)))
    }

    /// Messages of one session, oldest first.
    pub async fn load_messages(
        &self,
        user: &UserIdentity,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>> {
        let query = Query::new()
            .filter(Filter::new().eq("session_id", session_id).eq("user_id", user.id.as_str()))
            .order(Order::asc("created_at"));
        let rows = self.data.select(tables::CHAT_MESSAGES, &query).await?;
        ports::from_rows(rows)
    }

    /// Sessions that have at least one message, most recently updated first.
    ///
    /// Zero-message sessions are never returned. Those older than the grace
    /// period are deleted on the way; younger ones may still be waiting on
    /// their first send and are left alone.
    pub async fn list_sessions(&self, user: &UserIdentity) -> Result<Vec<SessionSummary>> {
        let owner = Filter::new().eq("user_id", user.id.as_str());

        let rows = self
            .data
            .select(
                tables::CHAT_SESSIONS,
                &Query::new().filter(owner.clone()).order(Order::desc("last_updated")),
            )
            .await?;
        let sessions: Vec<ChatSession> = ports::from_rows(rows)?;

        let rows = self
            .data
            .select(
                tables::CHAT_MESSAGES,
                &Query::new().filter(owner.clone()).order(Order::asc("created_at")),
            )
            .await?;
        let messages: Vec<ChatMessage> = ports::from_rows(rows)?;

        let mut stats: HashMap<&str, (usize, &ChatMessage)> = HashMap::new();
        for msg in &messages {
            stats
                .entry(msg.session_id.as_str())
                .and_modify(|(count, latest)| {
                    *count += 1;
                    if msg.created_at >= latest.created_at {
                        *latest = msg;
                    }
                })
                .or_insert((1, msg));
        }

        let cutoff = Utc::now() - self.grace_period();
        let mut summaries = Vec::new();
        let mut abandoned = Vec::new();
        for session in sessions {
            match stats.get(session.id.as_str()) {
                Some((count, latest)) => summaries.push(SessionSummary {
                    preview: latest.content.clone(),
                    message_count: *count,
                    session,
                }),
                None if session.created_at <= cutoff => abandoned.push(session.id),
                None => {}
            }
        }

        if !abandoned.is_empty() {
            log::info!("Removing {} abandoned chat session(s)", abandoned.len());
            let filter = owner.one_of("id", abandoned);
            if let Err(e) = self.data.delete(tables::CHAT_SESSIONS, &filter).await {
                log::warn!("Abandoned session cleanup failed: {}", e);
            }
        }

        Ok(summaries)
    }

    /// Delete a session's messages, then the session.
    ///
    /// Not transactional: if the second delete fails the session is left
    /// with no messages, is hidden from `list_sessions`, and is removed by
    /// its cleanup pass.
    pub async fn delete_session(&self, user: &UserIdentity, session_id: &str) -> Result<()> {
        log::info!("Deleting chat session {}", session_id);
        let owned = |column: &str| Filter::new().eq(column, session_id).eq("user_id", user.id.as_str());

        self.data.delete(tables::CHAT_MESSAGES, &owned("session_id")).await?;
        if let Err(e) = self.data.delete(tables::CHAT_SESSIONS, &owned("id")).await {
            log::error!(
                "Messages of session {} deleted but the session row remains: {}",
                session_id, e
            );
            return Err(e);
        }

        self.event_bus.emit(ChatEvent::SessionDeleted {
            session_id: session_id.to_string(),
        });
        Ok(())
    }

    /// First `title_max_chars` characters of the opening message.
    pub fn derive_title(&self, text: &str) -> String {
        text.trim().chars().take(self.config.title_max_chars).collect()
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) async fn create_session(
        &self,
        user: &UserIdentity,
        first_text: &str,
    ) -> Result<ChatSession> {
        let now = self.now();
        let row = ports::to_row(&NewChatSession {
            user_id: user.id.clone(),
            title: Some(self.derive_title(first_text)),
            mood: self.config.default_mood.clone(),
            created_at: now,
            last_updated: now,
        })?;
        let rows = self.data.insert(tables::CHAT_SESSIONS, vec![row]).await?;
        let session: ChatSession = ports::first_row(rows, "session insert")?;
        log::info!("Created chat session {}", session.id);
        Ok(session)
    }

    /// Ask the completion service about one user turn. Prior turns are not sent.
    pub(crate) async fn ask(&self, text: &str) -> Result<String> {
        self.completion.complete(&self.config.system_prompt, text).await
    }

    /// Write the user/assistant pair, then bump the session.
    ///
    /// When `backfill_title` is set the bump also fills an empty title; the
    /// update is gated on the title still being blank, so an existing title
    /// is never replaced. Returns whether the title was written.
    pub(crate) async fn persist_exchange(
        &self,
        user: &UserIdentity,
        session_id: &str,
        exchange: Exchange<'_>,
        backfill_title: bool,
    ) -> Result<bool> {
        let rows = vec![
            ports::to_row(&NewChatMessage::new(
                &user.id,
                session_id,
                Origin::User,
                exchange.user_text,
                exchange.user_at,
            ))?,
            ports::to_row(&NewChatMessage::new(
                &user.id,
                session_id,
                Origin::Assistant,
                exchange.reply,
                exchange.reply_at,
            ))?,
        ];
        self.data.insert(tables::CHAT_MESSAGES, rows).await?;

        let session = Filter::new().eq("id", session_id).eq("user_id", user.id.as_str());
        let now = self.now();

        if backfill_title {
            let patch = json!({
                "title": self.derive_title(exchange.user_text),
                "last_updated": now,
            });
            let untitled = session.clone().is_blank("title");
            let affected = self.data.update(tables::CHAT_SESSIONS, patch, &untitled).await?;
            if !affected.is_empty() {
                return Ok(true);
            }
        }

        self.data
            .update(tables::CHAT_SESSIONS, json!({ "last_updated": now }), &session)
            .await?;
        Ok(false)
    }

    fn grace_period(&self) -> Duration {
        // Capped well inside chrono's range
        Duration::seconds(self.config.provisional_grace_secs.min(MAX_GRACE_SECS) as i64)
    }
}

/// One completed user turn, ready to be written.
pub(crate) struct Exchange<'a> {
    pub user_text: &'a str,
    pub user_at: DateTime<Utc>,
    pub reply: &'a str,
    pub reply_at: DateTime<Utc>,
}
