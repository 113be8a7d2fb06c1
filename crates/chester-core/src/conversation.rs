//! Conversation: the chat state machine for one open chat screen.
//!
//! A conversation starts in `NoSession` and moves to `Active(id)` the first
//! time a send reaches the backend. `Deleted` is terminal.
//!
//! Every backend write (session creation, storing an exchange, deletion)
//! runs under one per-conversation lock and re-reads the state once the
//! lock is held. Overlapping sends therefore share one session, and a send
//! that overlaps a delete writes nothing. The completion call runs outside
//! the lock.
//!
//! Send cycle:
//! 1. Show the user message locally
//! 2. Resolve (or lazily create) the session
//! 3. Ask the completion service about this one turn
//! 4. Show the reply, or a fallback reply on failure
//! 5. Persist the message pair and bump the session

use std::cell::{Cell, RefCell};

use futures::lock::Mutex;
use chester_types::{
    ChesterError, Result,
    event::ChatEvent,
    message::Origin,
    session::ChatSession,
    user::UserIdentity,
};
use crate::session::{Exchange, SessionManager};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    /// Nothing persisted yet
    NoSession,
    /// Backed by this session id for the rest of the conversation's life
    Active(String),
    /// Session and messages removed; no further sends
    Deleted,
}

/// A line of the on-screen transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub origin: Origin,
    pub content: String,
    /// Known to be stored by the backend
    pub saved: bool,
}

impl TranscriptEntry {
    pub(crate) fn saved(origin: Origin, content: String) -> Self {
        Self {
            origin,
            content,
            saved: true,
        }
    }

    fn local(origin: Origin, content: impl Into<String>) -> Self {
        Self {
            origin,
            content: content.into(),
            saved: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The reply was shown and the exchange stored
    Replied { session_id: String, reply: String },
    /// The completion service failed; the fallback reply was shown and
    /// nothing was stored for this turn
    Fallback { session_id: String, error: ChesterError },
}

pub struct Conversation {
    manager: SessionManager,
    state: RefCell<ConversationState>,
    writes: Mutex<()>,
    /// Whether the backing session is known to have a title
    titled: Cell<bool>,
    transcript: RefCell<Vec<TranscriptEntry>>,
    awaiting: Cell<usize>,
}

impl Conversation {
    pub(crate) fn new(manager: SessionManager) -> Self {
        Self {
            manager,
            state: RefCell::new(ConversationState::NoSession),
            writes: Mutex::new(()),
            titled: Cell::new(false),
            transcript: RefCell::new(Vec::new()),
            awaiting: Cell::new(0),
        }
    }

    pub(crate) fn resumed(
        manager: SessionManager,
        session: ChatSession,
        transcript: Vec<TranscriptEntry>,
    ) -> Self {
        let conversation = Self::new(manager);
        conversation.titled.set(session.has_title());
        *conversation.state.borrow_mut() = ConversationState::Active(session.id);
        *conversation.transcript.borrow_mut() = transcript;
        conversation
    }

    pub fn state(&self) -> ConversationState {
        self.state.borrow().clone()
    }

    pub fn session_id(&self) -> Option<String> {
        match &*self.state.borrow() {
            ConversationState::Active(id) => Some(id.clone()),
            _ => None,
        }
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.borrow().clone()
    }

    /// True while a completion request is outstanding (typing indicator).
    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting.get() > 0
    }

    /// Send one user turn. See the module docs for the cycle.
    ///
    /// A failed or timed-out completion is not an error: the fallback reply
    /// is shown and `SendOutcome::Fallback` returned. Any other completion
    /// error, and backend failures while creating the session or storing the
    /// exchange, are returned as errors; the user message stays in the
    /// transcript, unsaved. If the conversation is deleted while the reply is
    /// pending, nothing is written and `ConversationClosed` is returned.
    pub async fn send(&self, user: &UserIdentity, text: &str) -> Result<SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChesterError::Validation("message is empty".to_string()));
        }
        if self.state() == ConversationState::Deleted {
            return Err(ChesterError::ConversationClosed);
        }

        let bus = self.manager.event_bus();
        let user_at = self.manager.now();
        let user_index = self.push(TranscriptEntry::local(Origin::User, text));
        bus.emit(ChatEvent::SendStarted {
            text: text.to_string(),
        });

        let session_id = match self.resolve_session(user, text).await {
            Ok(id) => id,
            Err(e) => {
                bus.emit(ChatEvent::PersistFailed {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        let answer = {
            let _typing = Typing::start(&self.awaiting);
            self.manager.ask(text).await
        };

        let _writing = self.writes.lock().await;
        if self.state() == ConversationState::Deleted {
            log::info!("Session {} was deleted while awaiting the reply", session_id);
            return Err(ChesterError::ConversationClosed);
        }

        let reply = match answer {
            Ok(reply) => reply,
            Err(e) if e.is_completion_failure() => {
                log::warn!("Completion failed for session {}: {}", session_id, e);
                self.push(TranscriptEntry::local(
                    Origin::Assistant,
                    self.manager.config().fallback_reply.as_str(),
                ));
                bus.emit(ChatEvent::ReplyFailed {
                    message: e.to_string(),
                });
                return Ok(SendOutcome::Fallback { session_id, error: e });
            }
            Err(e) => {
                log::error!("Completion request for session {} rejected: {}", session_id, e);
                bus.emit(ChatEvent::ReplyFailed {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        let reply_at = self.manager.now();
        let reply_index = self.push(TranscriptEntry::local(Origin::Assistant, reply.as_str()));
        bus.emit(ChatEvent::ReplyReceived {
            text: reply.clone(),
        });

        let exchange = Exchange {
            user_text: text,
            user_at,
            reply: &reply,
            reply_at,
        };
        match self
            .manager
            .persist_exchange(user, &session_id, exchange, !self.titled.get())
            .await
        {
            Ok(_) => {
                self.titled.set(true);
                self.mark_saved(&[user_index, reply_index]);
                bus.emit(ChatEvent::Persisted {
                    session_id: session_id.clone(),
                });
                Ok(SendOutcome::Replied { session_id, reply })
            }
            Err(e) => {
                log::warn!("Storing exchange for session {} failed: {}", session_id, e);
                bus.emit(ChatEvent::PersistFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Delete the backing session and its messages, then close the conversation.
    /// A conversation that never created a session just closes.
    pub async fn delete(&self, user: &UserIdentity) -> Result<()> {
        let _writing = self.writes.lock().await;
        let session_id = match self.state() {
            ConversationState::Active(id) => id,
            ConversationState::NoSession => {
                *self.state.borrow_mut() = ConversationState::Deleted;
                return Ok(());
            }
            ConversationState::Deleted => return Ok(()),
        };
        self.manager.delete_session(user, &session_id).await?;
        *self.state.borrow_mut() = ConversationState::Deleted;
        self.transcript.borrow_mut().clear();
        Ok(())
    }

    /// At most one session is created per conversation, however many sends
    /// overlap. A deleted conversation stays deleted.
    async fn resolve_session(&self, user: &UserIdentity, first_text: &str) -> Result<String> {
        let _writing = self.writes.lock().await;
        match self.state() {
            ConversationState::Active(id) => return Ok(id),
            ConversationState::Deleted => return Err(ChesterError::ConversationClosed),
            ConversationState::NoSession => {}
        }

        let session = self.manager.create_session(user, first_text).await?;
        self.titled.set(session.has_title());
        *self.state.borrow_mut() = ConversationState::Active(session.id.clone());
        self.manager.event_bus().emit(ChatEvent::SessionCreated {
            session_id: session.id.clone(),
        });
        Ok(session.id)
    }

    fn push(&self, entry: TranscriptEntry) -> usize {
        let mut transcript = self.transcript.borrow_mut();
        transcript.push(entry);
        transcript.len() - 1
    }

    fn mark_saved(&self, indices: &[usize]) {
        let mut transcript = self.transcript.borrow_mut();
        for &i in indices {
            if let Some(entry) = transcript.get_mut(i) {
                entry.saved = true;
            }
        }
    }
}

/// Keeps the typing indicator on for as long as it lives, including when
/// the send future is dropped mid-request.
struct Typing<'a>(&'a Cell<usize>);

impl<'a> Typing<'a> {
    fn start(awaiting: &'a Cell<usize>) -> Self {
        awaiting.set(awaiting.get() + 1);
        Self(awaiting)
    }
}

impl Drop for Typing<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}
