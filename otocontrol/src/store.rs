//! Session persistence abstraction.
//!
//! The original site keeps the last played track and position in the
//! browser's `localStorage`; [`SessionStore`] is that contract reduced to
//! plain string keys. Key composition (`{identity}_{field}`) lives in
//! [`SessionKeys`](crate::SessionKeys), not here.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// String key/value store scoped to the embedding (browser storage, a
/// settings file, a test map). Writes overwrite silently, reads of absent
/// keys return `None`; the contract has no failure mode, like
/// `localStorage`.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-memory [`SessionStore`]. Clones share the underlying map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}
