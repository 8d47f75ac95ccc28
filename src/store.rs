//! Subscription and watch-state persistence.
//!
//! The engine only needs three things from storage: the subscription list,
//! a write-once slot for each alias's resolved id, and the set of watched
//! items.  [`SubscriptionStore`] is that contract; [`MemoryStore`] and
//! [`JsonFileStore`] implement it.
//!
//! Mutations never fail from the caller's point of view.  `JsonFileStore`
//! writes through to disk after each change and only logs if that fails; the
//! in-memory state stays authoritative for the rest of the session.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::source::Source;

/// Storage contract consumed by the aggregator and the viewer.
pub trait SubscriptionStore: Send + Sync {
    fn subscriptions(&self) -> Vec<Source>;

    /// Record that `alias` resolves to `id`.
    ///
    /// Write-once: a record that already carries a resolved id is left
    /// alone.  Returns whether anything changed.
    fn set_resolved_id(&self, alias: &str, id: &str) -> bool;

    fn watched(&self) -> HashSet<String>;

    /// Add `source` unless one with the same `source_ref` exists.
    fn add_subscription(&self, source: Source) -> bool;

    fn remove_subscription(&self, source_ref: &str) -> bool;

    fn mark_watched(&self, item_id: &str) -> bool;

    fn is_watched(&self, item_id: &str) -> bool {
        self.watched().contains(item_id)
    }
}

/// The persisted document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    subscriptions: Vec<Source>,
    #[serde(default)]
    watched: BTreeSet<String>,
}

impl StoreData {
    fn set_resolved_id(&mut self, alias: &str, id: &str) -> bool {
        let mut changed = false;
        for source in self
            .subscriptions
            .iter_mut()
            .filter(|s| s.source_ref == alias && s.resolved_id.is_none())
        {
            source.resolved_id = Some(id.to_string());
            changed = true;
        }
        changed
    }

    fn add_subscription(&mut self, source: Source) -> bool {
        if self.subscriptions.iter().any(|s| s.source_ref == source.source_ref) {
            return false;
        }
        self.subscriptions.push(source);
        true
    }

    fn remove_subscription(&mut self, source_ref: &str) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.source_ref != source_ref);
        self.subscriptions.len() != before
    }

    fn mark_watched(&mut self, item_id: &str) -> bool {
        self.watched.insert(item_id.to_string())
    }
}

fn lock(data: &Mutex<StoreData>) -> MutexGuard<'_, StoreData> {
    // Every mutation is a single insert/retain; poison carries no meaning.
    data.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Non-persistent store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriptions(subscriptions: Vec<Source>) -> Self {
        Self {
            data: Mutex::new(StoreData {
                subscriptions,
                watched: BTreeSet::new(),
            }),
        }
    }
}

impl SubscriptionStore for MemoryStore {
    fn subscriptions(&self) -> Vec<Source> {
        lock(&self.data).subscriptions.clone()
    }

    fn set_resolved_id(&self, alias: &str, id: &str) -> bool {
        lock(&self.data).set_resolved_id(alias, id)
    }

    fn watched(&self) -> HashSet<String> {
        lock(&self.data).watched.iter().cloned().collect()
    }

    fn add_subscription(&self, source: Source) -> bool {
        lock(&self.data).add_subscription(source)
    }

    fn remove_subscription(&self, source_ref: &str) -> bool {
        lock(&self.data).remove_subscription(source_ref)
    }

    fn mark_watched(&self, item_id: &str) -> bool {
        lock(&self.data).mark_watched(item_id)
    }
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// Store backed by a single JSON document on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

impl JsonFileStore {
    /// Open the store at `path`.  A missing file is an empty store; it is
    /// created on the first change.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read store file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse store file: {}", path.display()))?
        } else {
            StoreData::default()
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current state to disk (temp file + rename).
    pub fn save(&self) -> Result<()> {
        self.write(&lock(&self.data))
    }

    /// Callers hold the data lock, so snapshots reach disk in mutation
    /// order and the shared temp file has one writer at a time.
    fn write(&self, data: &StoreData) -> Result<()> {
        let json = serde_json::to_string_pretty(data).context("Failed to serialize store")?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    /// Apply `change`; persist if it reports a modification.
    fn mutate(&self, change: impl FnOnce(&mut StoreData) -> bool) -> bool {
        let mut data = lock(&self.data);
        let changed = change(&mut data);
        if changed {
            if let Err(e) = self.write(&data) {
                tracing::warn!(path = %self.path.display(), error = format!("{e:#}"), "store not persisted");
            }
        }
        changed
    }
}

impl SubscriptionStore for JsonFileStore {
    fn subscriptions(&self) -> Vec<Source> {
        lock(&self.data).subscriptions.clone()
    }

    fn set_resolved_id(&self, alias: &str, id: &str) -> bool {
        self.mutate(|d| d.set_resolved_id(alias, id))
    }

    fn watched(&self) -> HashSet<String> {
        lock(&self.data).watched.iter().cloned().collect()
    }

    fn add_subscription(&self, source: Source) -> bool {
        self.mutate(|d| d.add_subscription(source))
    }

    fn remove_subscription(&self, source_ref: &str) -> bool {
        self.mutate(|d| d.remove_subscription(source_ref))
    }

    fn mark_watched(&self, item_id: &str) -> bool {
        self.mutate(|d| d.mark_watched(item_id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
