//! Command history for rcon-console
//!
//! Keeps the commands typed at the `rcon>` prompt so the line editor can
//! recall them across sessions. Entries are stored one per line as
//! `<unix timestamp>;<command>`.

use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

/// Substrings that keep a command out of the history file
const SENSITIVE_WORDS: [&str; 7] = [
    "password",
    "passwd",
    "secret",
    "token",
    "api_key",
    "apikey",
    "credential",
];

/// One remembered command
#[derive(Clone, Debug, PartialEq, Eq)]
struct HistoryEntry {
    timestamp: u64,
    command: String,
}

impl HistoryEntry {
    fn now(command: &str) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        Self {
            timestamp,
            command: command.to_string(),
        }
    }

    /// Parse one `<timestamp>;<command>` line
    fn parse(line: &str) -> Option<Self> {
        let (timestamp, command) = line.split_once(';')?;
        Some(Self {
            timestamp: timestamp.parse().ok()?,
            command: command.to_string(),
        })
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.timestamp, self.command)
    }
}

/// Commands typed at the prompt, oldest first, mirrored to a file
pub struct CommandHistory {
    entries: VecDeque<HistoryEntry>,
    /// `None` keeps the history in memory only
    file_path: Option<PathBuf>,
    limit: usize,
}

impl CommandHistory {
    /// Open the history at `file_path`, keeping at most `limit` commands
    pub fn new(file_path: Option<PathBuf>, limit: usize) -> Self {
        let entries = file_path
            .as_deref()
            .map(read_entries)
            .unwrap_or_default();
        let mut history = Self {
            entries,
            file_path,
            limit,
        };
        history.enforce_limit();
        history
    }

    /// Record `command` and persist the history
    ///
    /// Returns `false` when the command was not recorded: blank, a repeat of
    /// the previous entry, or sensitive.
    pub fn add(&mut self, command: &str) -> bool {
        let command = command.trim();
        let repeated = self
            .entries
            .back()
            .is_some_and(|last| last.command == command);
        if command.is_empty() || repeated || is_sensitive(command) {
            return false;
        }

        self.entries.push_back(HistoryEntry::now(command));
        self.enforce_limit();
        self.persist();
        true
    }

    /// Commands, oldest first
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.command.as_str())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn enforce_limit(&mut self) {
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    fn persist(&self) {
        let Some(path) = self.file_path.as_deref() else {
            return;
        };
        let mut content = String::new();
        for entry in &self.entries {
            content.push_str(&entry.to_string());
            content.push('\n');
        }
        if let Err(e) = fs::write(path, content) {
            warn!("Failed to write history {}: {}", path.display(), e);
        }
    }
}

/// Entries stored at `path`; a missing file is an empty history and
/// unparsable lines are dropped
fn read_entries(path: &Path) -> VecDeque<HistoryEntry> {
    match fs::read_to_string(path) {
        Ok(content) => content.lines().filter_map(HistoryEntry::parse).collect(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => VecDeque::new(),
        Err(e) => {
            warn!("Failed to read history {}: {}", path.display(), e);
            VecDeque::new()
        }
    }
}

fn is_sensitive(command: &str) -> bool {
    let lower = command.to_lowercase();
    SENSITIVE_WORDS.iter().any(|word| lower.contains(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_in(dir: &tempfile::TempDir, limit: usize) -> CommandHistory {
        CommandHistory::new(Some(dir.path().join("history")), limit)
    }

    #[test]
    fn test_skips_blank_and_repeated() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = history_in(&dir, 10);

        assert!(history.add("list"));
        assert!(!history.add("list"));
        assert!(!history.add("   "));
        assert!(history.add("  time set day  "));
        assert!(history.add("list"));

        let commands: Vec<_> = history.commands().collect();
        assert_eq!(commands, vec!["list", "time set day", "list"]);
    }

    #[test]
    fn test_skips_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = history_in(&dir, 10);

        assert!(!history.add("authme changepassword steve hunter2"));
        assert!(!history.add("discord token abc"));
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = history_in(&dir, 2);

        history.add("one");
        history.add("two");
        history.add("three");

        let commands: Vec<_> = history.commands().collect();
        assert_eq!(commands, vec!["two", "three"]);
    }

    #[test]
    fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut history = history_in(&dir, 10);
            history.add("whitelist add steve");
            history.add("save-all");
        }

        let reloaded = history_in(&dir, 10);
        let commands: Vec<_> = reloaded.commands().collect();
        assert_eq!(commands, vec!["whitelist add steve", "save-all"]);
    }

    #[test]
    fn test_ignores_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("history"), "garbage\n17;list\nx;y\n").unwrap();

        let history = history_in(&dir, 10);
        let commands: Vec<_> = history.commands().collect();
        assert_eq!(commands, vec!["list"]);
    }

    #[test]
    fn test_file_keeps_one_entry_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = history_in(&dir, 10);
        history.add("list");
        history.add("save-all");

        let content = fs::read_to_string(dir.path().join("history")).unwrap();
        let commands: Vec<_> = content
            .lines()
            .map(|line| HistoryEntry::parse(line).unwrap().command)
            .collect();
        assert_eq!(commands, vec!["list", "save-all"]);
    }

    #[test]
    fn test_without_file() {
        let mut history = CommandHistory::new(None, 10);
        assert!(history.add("list"));
        assert_eq!(history.len(), 1);
    }
}
