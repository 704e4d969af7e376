//! LruBackend: bounded cache store

use std::sync::Arc;

use cacheable::backend::{register_backend_type, CacheStats, Compute};
use cacheable::{CacheBackend, CacheKey, Result, Value};
use parking_lot::Mutex;
use tracing::trace;

use crate::lru::LruMap;

/// Capacity used when the backend is created by name
pub const DEFAULT_CAPACITY: usize = 1024;

/// Cache store holding at most `capacity` entries
///
/// A hit marks the entry most recently used; inserting into a full store
/// evicts the least recently used entry.
pub struct LruBackend {
    entries: Mutex<LruMap<CacheKey, Value>>,
    stats: CacheStats,
}

impl LruBackend {
    /// Create an empty store
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LruMap::new(capacity)),
            stats: CacheStats::new(),
        }
    }

    /// Stored value for `key`, without touching recency
    pub fn peek(&self, key: &CacheKey) -> Option<Value> {
        self.entries.lock().peek(key).cloned()
    }

    /// Is an entry stored under `key`
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().peek(key).is_some()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.entries.lock().capacity()
    }

    /// Hit/miss/eviction statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn store(&self, key: CacheKey, value: Value) {
        let evicted = self.entries.lock().insert(key, value);
        self.stats.record_insert();

        if let Some((old_key, _)) = evicted {
            trace!(key = %old_key, "lru eviction");
            self.stats.record_eviction();
        }
    }
}

impl Default for LruBackend {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CacheBackend for LruBackend {
    fn fetch(&self, key: &CacheKey, _options: &Value, compute: &mut Compute<'_>) -> Result<Value> {
        {
            let mut entries = self.entries.lock();
            if let Some(value) = entries.get(key) {
                self.stats.record_hit();
                return Ok(value.clone());
            }
        }

        // Lock released before computing
        self.stats.record_miss();
        let value = compute()?;
        self.store(key.clone(), value.clone());
        Ok(value)
    }

    fn delete(&self, key: &CacheKey) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    fn clear(&self) {
        self.entries.lock().clear();
        self.stats.reset();
    }

    fn name(&self) -> &'static str {
        "lru"
    }
}

/// Register `LruBackend` so `set_backend("lru")` creates stores of `capacity`
pub fn install(capacity: usize) {
    register_backend_type(
        "LruBackend",
        Arc::new(move || Arc::new(LruBackend::new(capacity)) as Arc<dyn CacheBackend>),
    );
}
