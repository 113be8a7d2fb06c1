use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted row of `journal_entries`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(deserialize_with = "crate::de::id")]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub mood: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker; deleted rows stay in the table
    #[serde(default, deserialize_with = "crate::de::flag")]
    pub deleted: bool,
}

impl JournalEntry {
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// Insert payload for `journal_entries`
#[derive(Debug, Clone, Serialize)]
pub struct NewJournalEntry {
    pub user_id: String,
    pub title: Option<String>,
    pub content: String,
    pub mood: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted: bool,
}

/// In-place edit of an existing entry
#[derive(Debug, Clone, Serialize)]
pub struct JournalPatch {
    pub title: Option<String>,
    pub content: String,
    pub mood: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate figures shown on the profile and home screens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalStats {
    pub entries_this_year: usize,
    pub total_words: usize,
    pub days_journaled: usize,
    pub longest_streak: usize,
}
