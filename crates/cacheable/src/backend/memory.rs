//! In-process reference backend

use std::collections::HashMap;

use ahash::RandomState;
use parking_lot::RwLock;
use serde_json::Value;

use super::stats::CacheStats;
use super::{CacheBackend, Compute};
use crate::error::Result;
use crate::key::CacheKey;

/// Unbounded map from key to value, local to the process
///
/// `fetch` is check-then-act: two threads missing the same key may both
/// compute, and the later write wins.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<CacheKey, Value, RandomState>>,
    stats: CacheStats,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored value for `key`
    pub fn read(&self, key: &CacheKey) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    /// Store `value` under `key`, returning it
    pub fn write(&self, key: CacheKey, value: Value) -> Value {
        self.entries.write().insert(key, value.clone());
        self.stats.record_insert();
        value
    }

    /// Is an entry stored under `key`
    pub fn exists(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Hit/miss statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl CacheBackend for MemoryBackend {
    fn fetch(&self, key: &CacheKey, _options: &Value, compute: &mut Compute<'_>) -> Result<Value> {
        if let Some(value) = self.read(key) {
            self.stats.record_hit();
            return Ok(value);
        }

        // No lock is held while computing
        self.stats.record_miss();
        let value = compute()?;
        Ok(self.write(key.clone(), value))
    }

    fn delete(&self, key: &CacheKey) -> bool {
        self.entries.write().remove(key).is_some()
    }

    fn clear(&self) {
        self.entries.write().clear();
        self.stats.reset();
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
