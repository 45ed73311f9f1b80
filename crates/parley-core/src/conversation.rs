//! Conversation persistence.
//!
//! Each conversation is one JSON document at
//! `$PARLEY_HOME/conversations/<id>.json`. Writes go through a temp file in
//! the same directory and are renamed into place.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::paths;
use crate::message::Message;

const TITLE_MAX_WIDTH: usize = 40;
pub const UNTITLED: &str = "New Chat";

/// A stored conversation document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub title: String,
    pub last_updated: DateTime<Utc>,
    pub messages: Vec<Message>,
}

/// Listing entry for a stored conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub last_updated: DateTime<Utc>,
    pub message_count: usize,
}

impl ConversationSummary {
    fn from_record(record: &ConversationRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            last_updated: record.last_updated,
            message_count: record.messages.len(),
        }
    }
}

/// Storage for conversations.
///
/// `load` returns exactly the messages passed to the most recent `save` for
/// the same id.
pub trait ConversationStore: Send + Sync {
    /// Inserts or replaces the conversation `id`.
    ///
    /// # Errors
    /// Returns an error if the conversation cannot be written.
    fn save(&self, id: &str, messages: &[Message], last_updated: DateTime<Utc>) -> Result<()>;

    /// # Errors
    /// Returns an error if a stored document exists but cannot be read.
    fn load(&self, id: &str) -> Result<Option<Vec<Message>>>;

    /// Summaries sorted most recent first.
    ///
    /// # Errors
    /// Returns an error if the store cannot be enumerated.
    fn list(&self) -> Result<Vec<ConversationSummary>>;

    /// Returns `true` if a conversation was removed.
    ///
    /// # Errors
    /// Returns an error if the conversation exists but cannot be removed.
    fn delete(&self, id: &str) -> Result<bool>;

    /// Resolves a full id or a unique id prefix.
    ///
    /// # Errors
    /// Returns an error when the prefix matches several conversations.
    fn resolve_id(&self, id_or_prefix: &str) -> Result<Option<String>> {
        let needle = id_or_prefix.trim();
        if needle.is_empty() {
            return Ok(None);
        }
        let matches: Vec<String> = self
            .list()?
            .into_iter()
            .map(|s| s.id)
            .filter(|id| id.starts_with(needle))
            .collect();
        if let Some(exact) = matches.iter().find(|id| *id == needle) {
            return Ok(Some(exact.clone()));
        }
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.into_iter().next()),
            n => bail!("Conversation id '{needle}' is ambiguous ({n} matches)"),
        }
    }
}

/// Title from the first user message, at most 40 columns wide including
/// the trailing `…` of a truncated title.
pub fn title_for(messages: &[Message]) -> String {
    let Some(first) = messages.iter().find(|m| m.is_user) else {
        return UNTITLED.to_string();
    };
    let line = first.text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.is_empty() {
        return UNTITLED.to_string();
    }

    if line.width() <= TITLE_MAX_WIDTH {
        return line;
    }

    let budget = TITLE_MAX_WIDTH - '…'.width().unwrap_or(1);
    let mut width = 0;
    let mut out = String::new();
    for ch in line.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        out.push(ch);
    }
    out.push('…');
    out
}

/// Returns a shortened conversation id for display.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

fn validate_id(id: &str) -> Result<()> {
    if id.is_empty()
        || id.starts_with('.')
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        bail!("Invalid conversation id '{id}'");
    }
    Ok(())
}

/// JSON-file store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under `$PARLEY_HOME/conversations`.
    pub fn open_default() -> Self {
        Self::new(paths::conversations_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn read_record(path: &Path) -> Result<ConversationRecord> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

impl ConversationStore for FileStore {
    fn save(&self, id: &str, messages: &[Message], last_updated: DateTime<Utc>) -> Result<()> {
        validate_id(id)?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let record = ConversationRecord {
            id: id.to_string(),
            title: title_for(messages),
            last_updated,
            messages: messages.to_vec(),
        };
        let json = serde_json::to_vec_pretty(&record).context("Failed to serialize conversation")?;

        let mut temp = tempfile::NamedTempFile::new_in(&self.dir)
            .context("Failed to create temp conversation file")?;
        temp.write_all(&json)
            .context("Failed to write temp conversation file")?;
        temp.as_file()
            .sync_all()
            .context("Failed to sync temp conversation file")?;
        let path = self.path_for(id);
        temp.persist(&path)
            .map_err(|e| anyhow!(e.error))
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        tracing::debug!(id, count = messages.len(), "saved conversation");
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<Vec<Message>>> {
        validate_id(id)?;
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Self::read_record(&path)?.messages))
    }

    fn list(&self) -> Result<Vec<ConversationSummary>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read {}", self.dir.display()))?;
        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            match Self::read_record(&path) {
                Ok(record) => summaries.push(ConversationSummary::from_record(&record)),
                Err(e) => tracing::warn!("Skipping unreadable conversation: {e:#}"),
            }
        }

        summaries.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(summaries)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        validate_id(id)?;
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
        Ok(true)
    }
}

/// In-process store with the same contract as [`FileStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, ConversationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, ConversationRecord>>> {
        self.records
            .lock()
            .map_err(|e| anyhow!("Conversation store lock poisoned: {e}"))
    }
}

impl ConversationStore for MemoryStore {
    fn save(&self, id: &str, messages: &[Message], last_updated: DateTime<Utc>) -> Result<()> {
        let record = ConversationRecord {
            id: id.to_string(),
            title: title_for(messages),
            last_updated,
            messages: messages.to_vec(),
        };
        self.records()?.insert(id.to_string(), record);
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<Vec<Message>>> {
        Ok(self.records()?.get(id).map(|r| r.messages.clone()))
    }

    fn list(&self) -> Result<Vec<ConversationSummary>> {
        let mut summaries: Vec<_> = self
            .records()?
            .values()
            .map(ConversationSummary::from_record)
            .collect();
        summaries.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(summaries)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.records()?.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn sample() -> Vec<Message> {
        vec![
            Message::user("How do I reverse a Vec?"),
            Message::assistant("Use `v.reverse()`."),
        ]
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("conversations"));

        store.save("abc-123", &sample(), at(10)).unwrap();
        assert_eq!(store.load("abc-123").unwrap(), Some(sample()));
        assert_eq!(store.load("missing").unwrap(), None);

        let updated = vec![Message::user("replaced")];
        store.save("abc-123", &updated, at(20)).unwrap();
        assert_eq!(store.load("abc-123").unwrap(), Some(updated));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_file_store_list_sorted_and_skips_junk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.save("old", &sample(), at(10)).unwrap();
        store.save("new", &[Message::user("later")], at(30)).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();

        let list = store.list().unwrap();
        let ids: Vec<_> = list.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(list[1].title, "How do I reverse a Vec?");
        assert_eq!(list[1].message_count, 2);
    }

    #[test]
    fn test_file_store_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.save("gone", &sample(), at(1)).unwrap();
        assert!(store.delete("gone").unwrap());
        assert!(!store.delete("gone").unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_rejects_path_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.save("../escape", &sample(), at(1)).is_err());
        assert!(store.load("a/b").is_err());
    }

    #[test]
    fn test_memory_store_contract() {
        let store = MemoryStore::new();
        store.save("a", &sample(), at(5)).unwrap();
        store.save("b", &[], at(6)).unwrap();
        assert_eq!(store.load("a").unwrap(), Some(sample()));
        assert_eq!(store.list().unwrap()[0].title, UNTITLED);
        assert!(store.delete("a").unwrap());
        assert_eq!(store.load("a").unwrap(), None);
    }

    #[test]
    fn test_resolve_id_by_prefix() {
        let store = MemoryStore::new();
        store.save("abcd1111", &sample(), at(1)).unwrap();
        store.save("abcd2222", &sample(), at(2)).unwrap();
        assert_eq!(
            store.resolve_id("abcd1").unwrap(),
            Some("abcd1111".to_string())
        );
        assert!(store.resolve_id("abcd").is_err());
        assert_eq!(store.resolve_id("zzz").unwrap(), None);
    }

    #[test]
    fn test_title_truncates_to_width() {
        let long = "a".repeat(60);
        let title = title_for(&[Message::user(long)]);
        assert_eq!(title, format!("{}…", "a".repeat(39)));
        assert_eq!(title.width(), 40);

        let exact = "b".repeat(40);
        assert_eq!(title_for(&[Message::user(exact.clone())]), exact);

        let wide = title_for(&[Message::user("漢".repeat(30))]);
        assert_eq!(wide, format!("{}…", "漢".repeat(19)));
        assert!(wide.width() <= 40);
        assert_eq!(title_for(&[Message::user("  multi\nline  ")]), "multi line");
        assert_eq!(title_for(&[Message::assistant("hi")]), UNTITLED);
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
