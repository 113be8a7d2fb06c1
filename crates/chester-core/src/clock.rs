//! Strictly increasing timestamps.
//!
//! Messages are displayed by `created_at`; two messages written in the same
//! millisecond must still sort in the order they were produced.

use std::cell::Cell;

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Cell<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wall-clock now, bumped past the previous reading if needed.
    pub fn now(&self) -> DateTime<Utc> {
        self.after(Utc::now())
    }

    fn after(&self, wall: DateTime<Utc>) -> DateTime<Utc> {
        let next = match self.last.get() {
            Some(prev) if wall <= prev => prev + Duration::milliseconds(1),
            _ => wall,
        };
        self.last.set(Some(next));
        next
    }
}
