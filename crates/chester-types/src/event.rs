use serde::{Deserialize, Serialize};

/// Events emitted by a conversation.
/// The presentation layer drains these to drive the transcript and typing indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatEvent {
    /// A send was accepted and the user message shown locally
    SendStarted { text: String },

    /// The conversation's backing session row was created
    SessionCreated { session_id: String },

    /// The completion service answered
    ReplyReceived { text: String },

    /// The completion service failed; a fallback reply was shown instead
    ReplyFailed { message: String },

    /// The message pair and session metadata were written
    Persisted { session_id: String },

    /// Writing the message pair or session metadata failed
    PersistFailed { message: String },

    /// The session and its messages were removed
    SessionDeleted { session_id: String },
}
