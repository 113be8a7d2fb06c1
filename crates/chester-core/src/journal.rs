//! Journal entry store.
//!
//! Entries are created and edited in place; deletion only flips the
//! `deleted` flag so the row can be restored later. Chat sessions, by
//! contrast, are hard-deleted (see `session`).

use std::rc::Rc;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde_json::json;
use chester_types::{
    ChesterError, Result,
    journal::{JournalEntry, JournalPatch, JournalStats, NewJournalEntry},
    user::UserIdentity,
};
use crate::ports::{self, tables, DataPort};
use crate::query::{Filter, Order, Query};
use crate::stats::journal_stats;

#[derive(Clone)]
pub struct JournalStore {
    data: Rc<dyn DataPort>,
}

impl JournalStore {
    pub fn new(data: Rc<dyn DataPort>) -> Self {
        Self { data }
    }

    /// Create an entry, or overwrite one in place when `existing_id` is given.
    /// Returns the stored entry's id.
    pub async fn save_entry(
        &self,
        user: &UserIdentity,
        existing_id: Option<&str>,
        title: Option<&str>,
        content: &str,
        mood: Option<&str>,
    ) -> Result<String> {
        if content.trim().is_empty() {
            return Err(ChesterError::Validation("journal content is empty".to_string()));
        }
        let now = Utc::now();

        match existing_id {
            Some(id) => {
                log::debug!("Updating journal entry {}", id);
                let patch = ports::to_row(&JournalPatch {
                    title: title.map(str::to_string),
                    content: content.to_string(),
                    mood: mood.map(str::to_string),
                    created_at: now,
                })?;
                let affected = self
                    .data
                    .update(tables::JOURNAL_ENTRIES, patch, &owned(user, id))
                    .await?;
                if affected.is_empty() {
                    return Err(ChesterError::NotFound(format!("journal entry {}", id)));
                }
                Ok(id.to_string())
            }
            None => {
                let row = ports::to_row(&NewJournalEntry {
                    user_id: user.id.clone(),
                    title: title.map(str::to_string),
                    content: content.to_string(),
                    mood: mood.map(str::to_string),
                    created_at: now,
                    deleted: false,
                })?;
                let rows = self.data.insert(tables::JOURNAL_ENTRIES, vec![row]).await?;
                let entry: JournalEntry = ports::first_row(rows, "journal insert")?;
                log::info!("Created journal entry {}", entry.id);
                Ok(entry.id)
            }
        }
    }

    /// Mark an entry deleted. Deleting an already-deleted entry succeeds.
    pub async fn soft_delete_entry(&self, user: &UserIdentity, entry_id: &str) -> Result<()> {
        log::info!("Soft-deleting journal entry {}", entry_id);
        let affected = self
            .data
            .update(tables::JOURNAL_ENTRIES, json!({ "deleted": true }), &owned(user, entry_id))
            .await?;
        if affected.is_empty() {
            return Err(ChesterError::NotFound(format!("journal entry {}", entry_id)));
        }
        Ok(())
    }

    /// Entries not soft-deleted, newest first.
    pub async fn list_active(&self, user: &UserIdentity) -> Result<Vec<JournalEntry>> {
        let query = Query::new()
            .filter(Filter::new().eq("user_id", user.id.as_str()).eq("deleted", false))
            .order(Order::desc("created_at"));
        let rows = self.data.select(tables::JOURNAL_ENTRIES, &query).await?;
        ports::from_rows(rows)
    }

    /// Direct lookup by id, deleted or not.
    pub async fn get_entry(&self, user: &UserIdentity, entry_id: &str) -> Result<JournalEntry> {
        let query = Query::new().filter(owned(user, entry_id)).limit(1);
        let rows = self.data.select(tables::JOURNAL_ENTRIES, &query).await?;
        ports::from_rows::<JournalEntry>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| ChesterError::NotFound(format!("journal entry {}", entry_id)))
    }

    /// Statistics in the device's local time zone.
    pub async fn compute_stats(&self, user: &UserIdentity) -> Result<JournalStats> {
        self.compute_stats_in(user, &Local, &Local::now()).await
    }

    pub async fn compute_stats_in<Tz: TimeZone>(
        &self,
        user: &UserIdentity,
        tz: &Tz,
        now: &DateTime<Tz>,
    ) -> Result<JournalStats> {
        let entries = self.list_active(user).await?;
        Ok(journal_stats(&entries, tz, now))
    }
}

fn owned(user: &UserIdentity, entry_id: &str) -> Filter {
    Filter::new().eq("id", entry_id).eq("user_id", user.id.as_str())
}
