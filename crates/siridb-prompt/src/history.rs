//! Bounded command history, persisted one entry per line.

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("cannot read history file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write history file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Most recent commands, oldest first.
///
/// The navigation cursor ranges over `0..=len`; `len` is the empty slot past
/// the newest entry.
#[derive(Debug, Clone)]
pub struct History {
    capacity: usize,
    entries: VecDeque<String>,
    cursor: usize,
    path: Option<PathBuf>,
}

impl History {
    pub fn new(capacity: usize, path: Option<PathBuf>) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity.min(1024)),
            cursor: 0,
            path,
        }
    }

    pub fn in_memory(capacity: usize) -> Self {
        Self::new(capacity, None)
    }

    /// Appends a command, evicting the oldest when full.
    ///
    /// Empty commands and a zero capacity are ignored.
    pub fn insert(&mut self, entry: &str) {
        if self.capacity == 0 || entry.is_empty() {
            return;
        }
        self.entries.push_back(entry.to_string());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len();
    }

    /// Steps towards older entries, stopping at the oldest.
    pub fn prev(&mut self) -> String {
        self.cursor = self.cursor.saturating_sub(1);
        self.current()
    }

    /// Steps towards newer entries; past the newest yields an empty line.
    pub fn next(&mut self) -> String {
        if self.cursor < self.entries.len() {
            self.cursor += 1;
        }
        self.current()
    }

    fn current(&self) -> String {
        self.entries.get(self.cursor).cloned().unwrap_or_default()
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads the history file. A missing file is an empty history.
    pub fn load(&mut self) -> Result<(), HistoryError> {
        let Some(path) = self.path.as_ref().filter(|_| self.capacity > 0) else {
            return Ok(());
        };
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(HistoryError::Read {
                    path: path.clone(),
                    source,
                })
            }
        };
        let lines: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .collect();
        let skip = lines.len().saturating_sub(self.capacity);
        self.entries = lines[skip..].iter().map(|line| line.to_string()).collect();
        self.cursor = self.entries.len();
        Ok(())
    }

    /// Writes every entry, creating the parent directory when needed.
    pub fn save(&self) -> Result<(), HistoryError> {
        let Some(path) = self.path.as_ref().filter(|_| self.capacity > 0) else {
            return Ok(());
        };
        let write_err = |source| HistoryError::Write {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let mut body = String::new();
        for entry in &self.entries {
            body.push_str(entry);
            body.push('\n');
        }
        std::fs::write(path, body).map_err(write_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_evicts_oldest_and_prev_walks_backwards() {
        let mut history = History::in_memory(3);
        for entry in ["a", "b", "c", "d"] {
            history.insert(entry);
        }
        assert_eq!(history.entries().collect::<Vec<_>>(), vec!["b", "c", "d"]);
        assert_eq!(history.prev(), "d");
        assert_eq!(history.prev(), "c");
        assert_eq!(history.prev(), "b");
        assert_eq!(history.prev(), "b");
        assert_eq!(history.next(), "c");
        assert_eq!(history.next(), "d");
        assert_eq!(history.next(), "");
        assert_eq!(history.next(), "");
    }

    #[test]
    fn insert_resets_navigation() {
        let mut history = History::in_memory(5);
        history.insert("one");
        history.insert("two");
        history.prev();
        history.prev();
        history.insert("three");
        assert_eq!(history.prev(), "three");
    }

    #[test]
    fn empty_entries_and_zero_capacity_are_ignored() {
        let mut history = History::in_memory(2);
        history.insert("");
        assert!(history.is_empty());
        assert_eq!(history.prev(), "");

        let mut disabled = History::in_memory(0);
        disabled.insert("list series");
        assert!(disabled.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("iris@dbtest.history.1");
        let mut history = History::new(10, Some(path.clone()));
        history.insert("list series");
        history.insert("show time_precision");
        history.save().expect("save");

        let mut loaded = History::new(10, Some(path));
        loaded.load().expect("load");
        assert_eq!(
            loaded.entries().collect::<Vec<_>>(),
            vec!["list series", "show time_precision"]
        );
        assert_eq!(loaded.prev(), "show time_precision");
    }

    #[test]
    fn load_keeps_only_newest_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history");
        std::fs::write(&path, "a\n\nb\r\nc\nd\n").expect("write");
        let mut history = History::new(2, Some(path));
        history.load().expect("load");
        assert_eq!(history.entries().collect::<Vec<_>>(), vec!["c", "d"]);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut history = History::new(5, Some(dir.path().join("absent")));
        history.load().expect("load");
        assert!(history.is_empty());
    }

    #[test]
    fn write_failure_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut history = History::new(5, Some(dir.path().to_path_buf()));
        history.insert("list series");
        let err = history.save().expect_err("directory is not writable as a file");
        assert!(matches!(err, HistoryError::Write { .. }));
        assert!(err.to_string().starts_with("cannot write history file"));
    }
}
