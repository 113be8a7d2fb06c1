use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An anonymized post in the community feed. Read-only from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityEntry {
    #[serde(deserialize_with = "crate::de::id")]
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub demographics: Option<String>,
    /// Cumulative support count, only ever incremented server-side
    #[serde(default, deserialize_with = "crate::de::counter")]
    pub supports: i64,
    pub created_at: DateTime<Utc>,
}
