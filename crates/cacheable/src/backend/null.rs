//! Backend that never stores

use serde_json::Value;

use super::{CacheBackend, Compute};
use crate::error::Result;
use crate::key::CacheKey;

/// Computes on every fetch and keeps nothing, which disables caching globally
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl NullBackend {
    /// Create the backend
    pub fn new() -> Self {
        NullBackend
    }
}

impl CacheBackend for NullBackend {
    fn fetch(&self, _key: &CacheKey, _options: &Value, compute: &mut Compute<'_>) -> Result<Value> {
        compute()
    }

    fn delete(&self, _key: &CacheKey) -> bool {
        false
    }

    fn clear(&self) {}

    fn name(&self) -> &'static str {
        "null"
    }
}
