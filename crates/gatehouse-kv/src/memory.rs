//! In-process key-value store

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::KvError;
use crate::store::KvStore;

/// `HashMap`-backed store; contents live as long as the process
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn ping(&self) -> Result<(), KvError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
