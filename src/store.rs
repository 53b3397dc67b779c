use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The Store holds the key-value pairs shared by every connection. It is
/// designed to be thread-safe, allowing it to be shared and cloned cheaply
/// using reference counting. The inner mutex is taken per operation and never
/// held across an await point, so unrelated connections only contend for the
/// duration of a single map access.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl Store {
    pub fn new() -> Store {
        Store {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Inserts or replaces `key`. Returns `true` when the key was newly
    /// created, `false` when an existing value was overwritten.
    pub fn insert(&self, key: String, value: String) -> bool {
        let mut map = self.inner.lock().unwrap();
        map.insert(key, value).is_none()
    }

    pub fn lookup(&self, key: &str) -> Option<String> {
        let map = self.inner.lock().unwrap();
        map.get(key).cloned()
    }

    /// Removes `key` if present. Returns whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        let mut map = self.inner.lock().unwrap();
        map.remove(key).is_some()
    }

    /// A point-in-time copy of the whole map, taken under the lock, suitable
    /// for serialization.
    pub fn snapshot_view(&self) -> Vec<(String, String)> {
        let map = self.inner.lock().unwrap();
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Replaces the entire contents in one step. Readers observe either the
    /// old contents or the new ones, never a mix.
    pub fn clear_and_load(&self, pairs: Vec<(String, String)>) {
        let mut map = self.inner.lock().unwrap();
        map.clear();
        map.extend(pairs);
    }

    pub fn len(&self) -> usize {
        let map = self.inner.lock().unwrap();
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
