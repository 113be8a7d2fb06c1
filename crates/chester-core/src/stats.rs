//! Journal statistics: yearly count, words, distinct days, longest streak.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use chester_types::journal::{JournalEntry, JournalStats};

/// Compute display statistics over active entries. Calendar days and the
/// current year are taken in `tz`.
pub fn journal_stats<Tz: TimeZone>(
    entries: &[JournalEntry],
    tz: &Tz,
    now: &DateTime<Tz>,
) -> JournalStats {
    let year = now.year();
    let active = entries.iter().filter(|e| !e.deleted);

    let mut stats = JournalStats::default();
    let mut days = BTreeSet::new();
    for entry in active {
        let local = entry.created_at.with_timezone(tz);
        if local.year() == year {
            stats.entries_this_year += 1;
        }
        stats.total_words += entry.word_count();
        days.insert(local.date_naive());
    }
    stats.days_journaled = days.len();
    stats.longest_streak = longest_streak(days);
    stats
}

/// Longest run of consecutive calendar days. Input order and duplicates
/// do not matter; no days gives 0.
pub fn longest_streak(days: impl IntoIterator<Item = NaiveDate>) -> usize {
    let days: BTreeSet<NaiveDate> = days.into_iter().collect();

    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in days {
        current = match previous {
            Some(prev) if prev.succ_opt() == Some(day) => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(day);
    }
    longest
}
