use super::HistoryEntry;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MAX_JOURNAL_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JournalError {
    #[error("journal entry is empty")]
    Empty,
    #[error("journal entry is {len} characters; the limit is {MAX_JOURNAL_CHARS}")]
    TooLong { len: usize },
}

/// Free-text note, optionally tied to the brain age current at the time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JournalEntry {
    pub recorded_at_ms: u64,
    pub text: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub brain_age: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn from_entries(entries: Vec<JournalEntry>) -> Self {
        Self { entries }
    }

    /// Trim and append. `latest` is the most recent history entry, if any.
    pub fn write(
        &mut self,
        text: &str,
        recorded_at_ms: u64,
        latest: Option<&HistoryEntry>,
    ) -> Result<&JournalEntry, JournalError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(JournalError::Empty);
        }
        let len = text.chars().count();
        if len > MAX_JOURNAL_CHARS {
            return Err(JournalError::TooLong { len });
        }
        self.entries.push(JournalEntry {
            recorded_at_ms,
            text: text.to_string(),
            brain_age: latest.map(|e| e.brain_age),
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Newest first, at most `n`.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().rev().take(n)
    }
}
