//! In-process memoize-forever cache.
//!
//! Entries are written once and live until the process exits. Nothing is
//! persisted.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use crate::ports::cache_port::ResultCache;

pub struct MemoizeForever<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> MemoizeForever<K, V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for MemoizeForever<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MemoizeForever<K, V>
where
    K: Eq + Hash,
{
    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(map) => map.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> ResultCache<K, V> for MemoizeForever<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        let map = match self.entries.read() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.get(key).cloned()
    }

    /// Last writer wins if two computations for one key ever race past the
    /// orchestrator's gate.
    fn put(&self, key: K, value: V) {
        let mut map = match self.entries.write() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.insert(key, value);
    }

    fn has(&self, key: &K) -> bool {
        match self.entries.read() {
            Ok(map) => map.contains_key(key),
            Err(poisoned) => poisoned.into_inner().contains_key(key),
        }
    }
}
