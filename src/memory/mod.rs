//! Keyed text stores used for short-term memory and knowledge.

use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tokio::sync::RwLock;

/// A stored piece of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Which store a reset applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    Memory,
    Knowledge,
    All,
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryKind::Memory => write!(f, "memory"),
            MemoryKind::Knowledge => write!(f, "knowledge"),
            MemoryKind::All => write!(f, "all"),
        }
    }
}

/// Operations of a keyed text store.
///
/// Stores are shared between agents and runs, so implementations handle
/// their own synchronization.
#[async_trait]
pub trait MemoryStore: Debug + Send + Sync {
    /// Insert or replace the value stored under `key`.
    async fn save(&self, key: &str, value: &str) -> Result<()>;

    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Entries ranked by how many words of `query` they contain, best first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MemoryEntry>>;

    /// Remove every entry.
    async fn reset(&self) -> Result<()>;

    async fn len(&self) -> Result<usize>;
}

/// In-process [`MemoryStore`]
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<Vec<MemoryEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `entries`; later duplicates replace earlier ones.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut stored: Vec<MemoryEntry> = Vec::new();
        let updated_at = Utc::now();
        for (key, value) in entries {
            let key = key.into();
            let value = value.into();
            match stored.iter_mut().find(|e| e.key == key) {
                Some(entry) => entry.value = value,
                None => stored.push(MemoryEntry {
                    key,
                    value,
                    updated_at,
                }),
            }
        }
        Self {
            entries: RwLock::new(stored),
        }
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        let updated_at = Utc::now();
        match entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.value = value.to_string();
                entry.updated_at = updated_at;
            }
            None => entries.push(MemoryEntry {
                key: key.to_string(),
                value: value.to_string(),
                updated_at,
            }),
        }
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|e| e.key == key).map(|e| e.value.clone()))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MemoryEntry>> {
        let words: Vec<String> = query
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        if words.is_empty() {
            return Ok(Vec::new());
        }

        let entries = self.entries.read().await;
        let mut scored: Vec<(usize, &MemoryEntry)> = entries
            .iter()
            .filter_map(|entry| {
                let haystack = format!("{} {}", entry.key, entry.value).to_lowercase();
                let score = words.iter().filter(|w| haystack.contains(w.as_str())).count();
                (score > 0).then_some((score, entry))
            })
            .collect();
        // stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    async fn reset(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }
}
