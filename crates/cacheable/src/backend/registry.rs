//! Process-wide backend selection
//!
//! One slot holds the current backend. It is filled with a [`MemoryBackend`]
//! on first access and can be replaced at any time; calls already in flight
//! keep the backend they read.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::info;

use super::{CacheBackend, MemoryBackend, NullBackend};
use crate::error::{Error, Result};

/// Constructor for a named backend type
pub type BackendFactory = Arc<dyn Fn() -> Arc<dyn CacheBackend> + Send + Sync>;

const BACKEND_SUFFIX: &str = "Backend";

static CURRENT: Lazy<RwLock<Arc<dyn CacheBackend>>> =
    Lazy::new(|| RwLock::new(Arc::new(MemoryBackend::new())));

static FACTORIES: Lazy<RwLock<HashMap<String, BackendFactory>>> = Lazy::new(|| {
    let mut factories: HashMap<String, BackendFactory> = HashMap::new();
    factories.insert(
        "MemoryBackend".to_string(),
        Arc::new(|| Arc::new(MemoryBackend::new()) as Arc<dyn CacheBackend>),
    );
    factories.insert(
        "NullBackend".to_string(),
        Arc::new(|| Arc::new(NullBackend::new()) as Arc<dyn CacheBackend>),
    );
    RwLock::new(factories)
});

/// A backend given by name or as an instance
#[derive(Clone)]
pub enum BackendRef {
    /// Name resolved through the naming convention (`memory` -> `MemoryBackend`)
    Named(String),
    /// Ready-made backend
    Instance(Arc<dyn CacheBackend>),
}

impl fmt::Debug for BackendRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            BackendRef::Instance(backend) => f.debug_tuple("Instance").field(&backend.name()).finish(),
        }
    }
}

impl From<&str> for BackendRef {
    fn from(name: &str) -> Self {
        BackendRef::Named(name.to_string())
    }
}

impl From<String> for BackendRef {
    fn from(name: String) -> Self {
        BackendRef::Named(name)
    }
}

impl<B> From<Arc<B>> for BackendRef
where
    B: CacheBackend + 'static,
{
    fn from(backend: Arc<B>) -> Self {
        BackendRef::Instance(backend)
    }
}

/// `lru` -> `LruBackend`, `two_tier` -> `TwoTierBackend`
pub fn backend_type_name(name: &str) -> String {
    let mut type_name: String = name
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect();
    type_name.push_str(BACKEND_SUFFIX);
    type_name
}

/// Make a backend type available by name
///
/// `type_name` follows the convention of [`backend_type_name`], so a type
/// registered as `LruBackend` is selected with `set_backend("lru")`.
pub fn register_backend_type(type_name: impl Into<String>, factory: BackendFactory) {
    FACTORIES.write().insert(type_name.into(), factory);
}

/// Turn a [`BackendRef`] into a backend instance
///
/// Names produce a fresh instance on every call.
pub fn resolve_backend(backend: impl Into<BackendRef>) -> Result<Arc<dyn CacheBackend>> {
    match backend.into() {
        BackendRef::Instance(backend) => Ok(backend),
        BackendRef::Named(name) => {
            let expected = backend_type_name(&name);
            let factory = FACTORIES.read().get(&expected).cloned();

            match factory {
                Some(factory) => Ok(factory()),
                None => Err(Error::UnknownBackend { name, expected }),
            }
        }
    }
}

/// Replace the current backend
pub fn set_backend(backend: impl Into<BackendRef>) -> Result<()> {
    let backend = resolve_backend(backend)?;
    info!(backend = backend.name(), "cache backend selected");
    *CURRENT.write() = backend;
    Ok(())
}

/// The current backend, created on first access
pub fn get_backend() -> Arc<dyn CacheBackend> {
    Arc::clone(&CURRENT.read())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_convention() {
        assert_eq!(backend_type_name("memory"), "MemoryBackend");
        assert_eq!(backend_type_name("MEMORY"), "MemoryBackend");
        assert_eq!(backend_type_name("not_real"), "NotRealBackend");
        assert_eq!(backend_type_name("two__tier"), "TwoTierBackend");
    }

    #[test]
    fn test_resolve_builtin_names() {
        assert_eq!(resolve_backend("memory").unwrap().name(), "memory");
        assert_eq!(resolve_backend("null".to_string()).unwrap().name(), "null");
    }

    #[test]
    fn test_resolve_creates_fresh_instances() {
        let a = resolve_backend("memory").unwrap();
        let b = resolve_backend("memory").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_resolve_unknown_name() {
        let err = resolve_backend("not_real").err().unwrap();
        match err {
            Error::UnknownBackend { name, expected } => {
                assert_eq!(name, "not_real");
                assert_eq!(expected, "NotRealBackend");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_instance_is_adopted() {
        let backend = Arc::new(MemoryBackend::new());
        let resolved = resolve_backend(Arc::clone(&backend)).unwrap();

        let adopted: Arc<dyn CacheBackend> = backend;
        assert!(Arc::ptr_eq(&resolved, &adopted));
    }

    #[test]
    fn test_register_custom_type() {
        register_backend_type(
            "RegistryTestBackend",
            Arc::new(|| Arc::new(NullBackend::new()) as Arc<dyn CacheBackend>),
        );
        assert_eq!(resolve_backend("registry_test").unwrap().name(), "null");
    }
}
