//! Append-only record of finished sessions.
//!
//! The kernel only ever appends; reading the log back is for dashboards and
//! coach prompts. Storage is somebody else's job: the log serialises to a
//! plain JSON array of entries.

mod journal;
mod stats;

pub use journal::{Journal, JournalEntry, JournalError, MAX_JOURNAL_CHARS};
pub use stats::{HistorySummary, Trend};

use crate::scoring::ScoreBundle;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistoryEntry {
    /// Unix milliseconds.
    pub recorded_at_ms: u64,
    pub scores: ScoreBundle,
    pub brain_age: u32,
}

/// Ordered session log, optionally capped (oldest entries drop first).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    entries: Vec<HistoryEntry>,
    cap: Option<usize>,
}

impl History {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            cap,
        }
    }

    /// Adopt previously stored entries, trimming to the cap.
    pub fn from_entries(entries: Vec<HistoryEntry>, cap: Option<usize>) -> Self {
        let mut h = Self { entries, cap };
        h.enforce_cap();
        h
    }

    pub fn cap(&self) -> Option<usize> {
        self.cap
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
        self.enforce_cap();
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary::from_entries(&self.entries)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.entries)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(raw: &str, cap: Option<usize>) -> serde_json::Result<Self> {
        let entries: Vec<HistoryEntry> = serde_json::from_str(raw)?;
        Ok(Self::from_entries(entries, cap))
    }

    fn enforce_cap(&mut self) {
        if let Some(cap) = self.cap {
            if self.entries.len() > cap {
                let excess = self.entries.len() - cap;
                self.entries.drain(..excess);
            }
        }
    }
}
