//! Keyed store abstraction and the write buffer used to make messages atomic.

use std::collections::BTreeMap;

/// Minimal key-value interface the core needs from the host.
pub trait KvStore {
    /// Reads the value at `key`.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Writes `value` at `key`.
    fn set(&mut self, key: &str, value: Vec<u8>);

    /// Removes `key`. Removing an absent key is a no-op.
    fn delete(&mut self, key: &str);

    /// All keys starting with `prefix`, in ascending order.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;

    /// Whether a value exists at `key`.
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// In-memory ordered store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub struct MemStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Vec<u8>) {
        self.entries.insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect()
    }
}

/// Buffers writes on top of a parent store. Nothing reaches the parent until
/// [`CacheStore::commit`]; dropping the cache discards the writes.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct CacheStore<'a, S: KvStore> {
    parent: &'a mut S,
    // `None` marks a pending delete.
    pending: BTreeMap<String, Option<Vec<u8>>>,
}

impl<'a, S: KvStore> CacheStore<'a, S> {
    /// Opens a write buffer over `parent`.
    pub fn new(parent: &'a mut S) -> Self {
        Self {
            parent,
            pending: BTreeMap::new(),
        }
    }

    /// Number of buffered writes and deletes.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Applies every buffered write and delete to the parent.
    pub fn commit(self) {
        for (key, value) in self.pending {
            match value {
                Some(value) => self.parent.set(&key, value),
                None => self.parent.delete(&key),
            }
        }
    }
}

impl<S: KvStore> KvStore for CacheStore<'_, S> {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        match self.pending.get(key) {
            Some(value) => value.clone(),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &str, value: Vec<u8>) {
        self.pending.insert(key.to_string(), Some(value));
    }

    fn delete(&mut self, key: &str) {
        self.pending.insert(key.to_string(), None);
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: BTreeMap<String, bool> = self
            .parent
            .keys_with_prefix(prefix)
            .into_iter()
            .map(|k| (k, true))
            .collect();
        for (key, value) in self
            .pending
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            keys.insert(key.clone(), value.is_some());
        }
        keys.into_iter()
            .filter_map(|(k, live)| live.then_some(k))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemStore {
        let mut store = MemStore::new();
        store.set("a/1", vec![1]);
        store.set("a/2", vec![2]);
        store.set("b/1", vec![3]);
        store
    }

    #[test]
    fn prefix_scan_is_bounded() {
        assert_eq!(seeded().keys_with_prefix("a/"), vec!["a/1", "a/2"]);
        assert!(seeded().keys_with_prefix("c/").is_empty());
    }

    #[test]
    fn cache_reads_its_own_writes_without_touching_parent() {
        let mut parent = seeded();
        let mut cache = CacheStore::new(&mut parent);
        cache.set("a/3", vec![9]);
        cache.delete("a/1");

        assert_eq!(cache.get("a/3"), Some(vec![9]));
        assert_eq!(cache.get("a/1"), None);
        assert_eq!(cache.keys_with_prefix("a/"), vec!["a/2", "a/3"]);
        drop(cache);

        assert_eq!(parent, seeded());
    }

    #[test]
    fn commit_applies_writes_and_deletes() {
        let mut parent = seeded();
        let mut cache = CacheStore::new(&mut parent);
        cache.set("b/1", vec![7]);
        cache.delete("a/2");
        assert_eq!(cache.pending_len(), 2);
        cache.commit();

        assert_eq!(parent.get("b/1"), Some(vec![7]));
        assert!(!parent.has("a/2"));
        assert_eq!(parent.len(), 2);
    }

    #[test]
    fn nested_caches_commit_upwards() {
        let mut parent = MemStore::new();
        let mut outer = CacheStore::new(&mut parent);
        {
            let mut inner = CacheStore::new(&mut outer);
            inner.set("k", vec![1]);
            inner.commit();
        }
        assert_eq!(outer.get("k"), Some(vec![1]));
        outer.commit();
        assert_eq!(parent.get("k"), Some(vec![1]));
    }
}
