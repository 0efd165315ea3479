//! Keyed string storage for history, journal, and the theme flag.
//!
//! Values are plain strings (JSON for the logs, `"true"`/`"false"` for the
//! flag). A value that cannot be read or parsed loads as empty with a warning
//! so a damaged file never blocks a new session.

use std::fs;
use std::io::ErrorKind;

use brainage::history::{History, Journal, JournalEntry};
use tracing::warn;

use crate::error::AppError;
use crate::paths::AppPaths;

pub const HISTORY_KEY: &str = "brainage.history";
pub const JOURNAL_KEY: &str = "brainage.journal";
pub const DARK_MODE_KEY: &str = "brainage.dark_mode";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError>;
    fn remove(&mut self, key: &str) -> Result<(), AppError>;
}

/// One file per key in the data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    paths: AppPaths,
}

impl FileStore {
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.paths.store_file(key);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::io(path, e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.paths.store_file(key);
        // Write-then-rename so a crash never leaves a half-written log.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| AppError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| AppError::io(&path, e))
    }

    fn remove(&mut self, key: &str) -> Result<(), AppError> {
        let path = self.paths.store_file(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::io(path, e)),
        }
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), AppError> {
        self.values.remove(key);
        Ok(())
    }
}

fn get_or_warn(store: &impl KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(v) => v,
        Err(e) => {
            warn!(key, error = %e, "unreadable stored value; using default");
            None
        }
    }
}

pub fn load_history(store: &impl KeyValueStore, cap: Option<usize>) -> History {
    let Some(raw) = get_or_warn(store, HISTORY_KEY) else {
        return History::new(cap);
    };
    History::from_json(&raw, cap).unwrap_or_else(|e| {
        warn!(key = HISTORY_KEY, error = %e, "corrupt history; starting empty");
        History::new(cap)
    })
}

pub fn save_history(store: &mut impl KeyValueStore, history: &History) -> Result<(), AppError> {
    let raw = history
        .to_json()
        .map_err(|e| AppError::json(HISTORY_KEY, e))?;
    store.set(HISTORY_KEY, &raw)
}

pub fn load_journal(store: &impl KeyValueStore) -> Journal {
    let Some(raw) = get_or_warn(store, JOURNAL_KEY) else {
        return Journal::default();
    };
    match serde_json::from_str::<Vec<JournalEntry>>(&raw) {
        Ok(entries) => Journal::from_entries(entries),
        Err(e) => {
            warn!(key = JOURNAL_KEY, error = %e, "corrupt journal; starting empty");
            Journal::default()
        }
    }
}

pub fn save_journal(store: &mut impl KeyValueStore, journal: &Journal) -> Result<(), AppError> {
    let raw =
        serde_json::to_string(journal.entries()).map_err(|e| AppError::json(JOURNAL_KEY, e))?;
    store.set(JOURNAL_KEY, &raw)
}

pub fn load_dark_mode(store: &impl KeyValueStore) -> bool {
    match get_or_warn(store, DARK_MODE_KEY).as_deref().map(str::trim) {
        Some("true") => true,
        Some("false") | None => false,
        Some(other) => {
            warn!(key = DARK_MODE_KEY, value = other, "unrecognised theme flag");
            false
        }
    }
}

pub fn save_dark_mode(store: &mut impl KeyValueStore, dark: bool) -> Result<(), AppError> {
    store.set(DARK_MODE_KEY, if dark { "true" } else { "false" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainage::history::HistoryEntry;
    use brainage::scoring::ScoreBundle;

    fn entry(at: u64, age: u32) -> HistoryEntry {
        HistoryEntry {
            recorded_at_ms: at,
            scores: ScoreBundle::new(280.0, 5, 2100.0),
            brain_age: age,
        }
    }

    #[test]
    fn file_store_round_trips_history_and_journal() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(AppPaths::at(dir.path()).unwrap());

        let mut history = History::new(Some(10));
        history.append(entry(1, 31));
        history.append(entry(2, 27));
        save_history(&mut store, &history).unwrap();

        let mut journal = Journal::default();
        journal.write("felt sharp", 3, history.latest()).unwrap();
        save_journal(&mut store, &journal).unwrap();

        assert_eq!(load_history(&store, Some(10)), history);
        let loaded = load_journal(&store);
        assert_eq!(loaded.entries()[0].brain_age, Some(27));
        assert!(dir.path().join("brainage.history.json").is_file());
    }

    #[test]
    fn missing_values_load_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(AppPaths::at(dir.path()).unwrap());
        assert!(load_history(&store, None).is_empty());
        assert!(load_journal(&store).entries().is_empty());
        assert!(!load_dark_mode(&store));
    }

    #[test]
    fn corrupt_values_fall_back_to_empty() {
        let mut store = MemoryStore::default();
        store.set(HISTORY_KEY, "{not json").unwrap();
        store.set(JOURNAL_KEY, "[1, 2]").unwrap();
        store.set(DARK_MODE_KEY, "maybe").unwrap();
        assert!(load_history(&store, None).is_empty());
        assert!(load_journal(&store).entries().is_empty());
        assert!(!load_dark_mode(&store));
    }

    #[test]
    fn dark_mode_flag_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(AppPaths::at(dir.path()).unwrap());
        save_dark_mode(&mut store, true).unwrap();
        assert!(load_dark_mode(&store));
        assert_eq!(store.get(DARK_MODE_KEY).unwrap().as_deref(), Some("true"));
        store.remove(DARK_MODE_KEY).unwrap();
        store.remove(DARK_MODE_KEY).unwrap();
        assert!(!load_dark_mode(&store));
    }

    #[test]
    fn loading_applies_the_cap() {
        let mut store = MemoryStore::default();
        let mut history = History::new(None);
        for i in 0..5 {
            history.append(entry(i, 30));
        }
        save_history(&mut store, &history).unwrap();
        let loaded = load_history(&store, Some(3));
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.entries()[0].recorded_at_ms, 2);
    }
}
