//! Seed memory: process-wide map from a memory key to the last prompt, seed, and image
//! generated under it. In-memory only; reset on restart.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Last-known generation for a memory key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    pub prompt_info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Base64 image payload (named after the browser field that renders it).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

static GLOBAL: Lazy<Arc<MemoryStore>> = Lazy::new(|| Arc::new(MemoryStore::new()));

/// Concurrent key -> entry map. Writes overwrite; last writer wins per key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared process-wide store used by the gateway.
    pub fn global() -> Arc<MemoryStore> {
        Arc::clone(&GLOBAL)
    }

    /// Returns a copy of the entry stored under `key`.
    pub fn get_memory(&self, key: &str) -> Option<MemoryEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Stores a copy of `entry` under `key`, replacing any previous entry.
    pub fn set_memory(&self, key: &str, entry: &MemoryEntry) {
        self.entries.insert(key.to_string(), entry.clone());
        tracing::debug!(target: "picto::memory", key, seed = ?entry.seed, "memory entry stored");
    }

    pub fn clear_memory(&self) {
        self.entries.clear();
        tracing::debug!(target: "picto::memory", "memory cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
