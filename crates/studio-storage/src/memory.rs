//! In-memory storage backend.

use crate::{DurableStorage, StorageResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Process-local storage. Nothing survives the process; every instance starts empty.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStorage for MemoryStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut data = self.data.lock().unwrap();
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let data = self.data.lock().unwrap();
        Ok(data.get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let mut data = self.data.lock().unwrap();
        Ok(data.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let storage = MemoryStorage::new();

        storage.set("studio.auth.session", "{}").unwrap();
        assert_eq!(storage.get("studio.auth.session").unwrap().as_deref(), Some("{}"));
        assert!(storage.has("studio.auth.session").unwrap());

        assert!(storage.delete("studio.auth.session").unwrap());
        assert!(!storage.delete("studio.auth.session").unwrap());
        assert!(!storage.has("studio.auth.session").unwrap());
    }

    #[test]
    fn test_instances_are_isolated() {
        let first = MemoryStorage::new();
        first.set("k", "v").unwrap();
        assert_eq!(MemoryStorage::new().get("k").unwrap(), None);
    }
}
