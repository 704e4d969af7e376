//! Cache backends
//!
//! The core needs three operations from a store: `fetch`, `delete` and
//! `clear`. [`MemoryBackend`] is the default; others are selected by name or
//! instance through [`set_backend`].

mod memory;
mod null;
mod registry;
mod stats;

use serde_json::Value;

use crate::error::Result;
use crate::key::CacheKey;

pub use memory::MemoryBackend;
pub use null::NullBackend;
pub use registry::{
    backend_type_name, get_backend, register_backend_type, resolve_backend, set_backend,
    BackendFactory, BackendRef,
};
pub use stats::{CacheStats, StatsSnapshot};

/// Producer of a value on a cache miss
pub type Compute<'a> = dyn FnMut() -> Result<Value> + 'a;

/// Contract every cache store satisfies
pub trait CacheBackend: Send + Sync {
    /// Return the value stored under `key`, or run `compute`, store its value
    /// and return it. `options` is passed through from registration
    /// untouched. A failed compute stores nothing.
    fn fetch(&self, key: &CacheKey, options: &Value, compute: &mut Compute<'_>) -> Result<Value>;

    /// Remove the entry for `key`; true if one existed
    fn delete(&self, key: &CacheKey) -> bool;

    /// Remove every entry
    fn clear(&self);

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
