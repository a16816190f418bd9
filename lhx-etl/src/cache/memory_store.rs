//! In-memory cache store

use super::{CacheKey, CacheStore};
use crate::error::CacheError;
use std::collections::HashMap;
use std::sync::Mutex;

/// Cache store kept in a map, keyed by entry name
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A panic while holding the lock cannot leave a half-written entry
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        Ok(self.lock().get(&key.file_name()).cloned())
    }

    fn put(&self, key: &CacheKey, body: &str) -> Result<(), CacheError> {
        self.lock().insert(key.file_name(), body.to_string());
        Ok(())
    }
}
