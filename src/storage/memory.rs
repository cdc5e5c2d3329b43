//! In-memory client store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::ClientStore;
use crate::core::StorageError;

/// Volatile store, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ClientStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::{KEY_THEME, KEY_TUTORIAL_COMPLETED};

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set(KEY_THEME, "dark").unwrap();
        store.set(KEY_TUTORIAL_COMPLETED, "true").unwrap();
        assert_eq!(store.get(KEY_THEME).unwrap().as_deref(), Some("dark"));
        assert_eq!(store.len(), 2);

        store.set(KEY_THEME, "light").unwrap();
        assert_eq!(store.get(KEY_THEME).unwrap().as_deref(), Some("light"));

        store.remove(KEY_THEME).unwrap();
        store.remove(KEY_THEME).unwrap();
        assert_eq!(store.get(KEY_THEME).unwrap(), None);
    }
}
