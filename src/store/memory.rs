//! Generic in-memory key/value store
//!
//! A single reader/writer lock guards the whole map. Values are cloned on
//! the way in and on the way out, so callers never hold a reference into
//! stored state. The lock is never held across an await point other than
//! its own acquisition.

use std::collections::HashMap;
use std::hash::Hash;

use tokio::sync::RwLock;

/// Outcome of an insert that lost against an existing key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyExists;

pub struct MemoryStore<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> MemoryStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Store a copy of `value` under `key` unless the key is already taken
    pub async fn insert(&self, key: K, value: &V) -> Result<(), KeyExists> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&key) {
            return Err(KeyExists);
        }
        entries.insert(key, value.clone());
        Ok(())
    }

    /// Copy of the value under `key`
    pub async fn get(&self, key: &K) -> Option<V> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &K) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Read-or-initialize the value under `key`, apply `update`, and return
    /// a copy of the result, all inside one write critical section.
    pub async fn upsert<I, F>(&self, key: K, init: I, update: F) -> V
    where
        I: FnOnce() -> V,
        F: FnOnce(&mut V),
    {
        let mut entries = self.entries.write().await;
        let value = entries.entry(key).or_insert_with(init);
        update(value);
        value.clone()
    }

    /// Snapshot of the keys currently stored, in unspecified order
    pub async fn keys(&self) -> Vec<K> {
        self.entries.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl<K, V> Default for MemoryStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
