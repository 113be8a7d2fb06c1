//! Community feed of anonymized posts with a one-way "resonate" counter.
//!
//! Resonating adds to a post's cumulative support count through an atomic
//! server-side increment. Un-resonating only changes local state; the
//! server counter is never decremented.

use std::collections::HashSet;
use std::rc::Rc;

use serde_json::json;
use chester_types::{Result, community::CommunityEntry};
use crate::ports::{self, procedures, tables, DataPort};
use crate::query::{Order, Query};

pub struct CommunityFeed {
    data: Rc<dyn DataPort>,
    entries: Vec<CommunityEntry>,
    resonated: HashSet<String>,
}

impl CommunityFeed {
    pub fn new(data: Rc<dyn DataPort>) -> Self {
        Self {
            data,
            entries: Vec::new(),
            resonated: HashSet::new(),
        }
    }

    /// Reload posts, newest first. Local resonate marks are kept.
    /// On failure the previous posts stay in place.
    pub async fn refresh(&mut self) -> Result<&[CommunityEntry]> {
        let query = Query::new()
            .columns(&["id", "content", "mood", "demographics", "supports", "created_at"])
            .order(Order::desc("created_at"));
        let rows = self.data.select(tables::COMMUNITY_ENTRIES, &query).await?;
        self.entries = ports::from_rows(rows)?;
        Ok(&self.entries)
    }

    pub fn entries(&self) -> &[CommunityEntry] {
        &self.entries
    }

    pub fn is_resonated(&self, entry_id: &str) -> bool {
        self.resonated.contains(entry_id)
    }

    /// Flip the local resonate mark and return the new state.
    ///
    /// Only turning it on calls the backend. The displayed count moves by one
    /// either way for immediate feedback; if the increment fails the local
    /// change is undone and the error returned.
    pub async fn toggle_resonate(&mut self, entry_id: &str) -> Result<bool> {
        let now_resonated = !self.is_resonated(entry_id);
        self.apply_local(entry_id, now_resonated);

        if now_resonated {
            let args = json!({ "post_id": entry_id });
            if let Err(e) = self.data.rpc(procedures::INCREMENT_SUPPORTS, args).await {
                log::warn!("Resonate on {} failed: {}", entry_id, e);
                self.apply_local(entry_id, false);
                return Err(e);
            }
        }
        Ok(now_resonated)
    }

    fn apply_local(&mut self, entry_id: &str, resonated: bool) {
        let delta = if resonated {
            self.resonated.insert(entry_id.to_string());
            1
        } else {
            self.resonated.remove(entry_id);
            -1
        };
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == entry_id) {
            entry.supports = (entry.supports + delta).max(0);
        }
    }
}
