//! Result cache port trait.

/// Memoization strategy for finished pipeline results.
pub trait ResultCache<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;
    fn put(&self, key: K, value: V);
    fn has(&self, key: &K) -> bool {
        self.get(key).is_some()
    }
}
