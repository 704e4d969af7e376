//! Declarative configuration
//!
//! ```json
//! {
//!   "backend": "memory",
//!   "methods": {
//!     "star_count": { "unless": "growing_fast?", "cache_options": { "expires_in": 3600 } }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::set_backend;
use crate::error::Result;
use crate::options::CacheableOptions;

/// Environment variable overriding the configured backend name
pub const BACKEND_ENV: &str = "CACHEABLE_BACKEND";

const DEFAULT_BACKEND: &str = "memory";

/// Backend choice and per-method options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Backend name, resolved through the registry
    pub backend: String,
    /// Method name -> declarative options object
    pub methods: BTreeMap<String, Value>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: DEFAULT_BACKEND.to_string(),
            methods: BTreeMap::new(),
        }
    }
}

impl CacheConfig {
    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Apply `CACHEABLE_BACKEND` if set and non-empty
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(backend) = std::env::var(BACKEND_ENV) {
            if !backend.trim().is_empty() {
                self.backend = backend.trim().to_string();
            }
        }
        self
    }

    /// Install the configured backend as the current one
    pub fn apply_backend(&self) -> Result<()> {
        set_backend(self.backend.as_str())
    }

    /// Options for `method`; defaults when the method is not listed
    pub fn options_for<T>(&self, method: &str) -> Result<CacheableOptions<T>>
    where
        T: Send + Sync + 'static,
    {
        match self.methods.get(method) {
            Some(value) => CacheableOptions::from_json(value),
            None => Ok(CacheableOptions::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use parking_lot::{Mutex, MutexGuard};
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

    /// Sets `CACHEABLE_BACKEND` for the guard's lifetime and restores it on drop
    struct EnvGuard {
        previous: Option<String>,
        _lock: MutexGuard<'static, ()>,
    }

    impl EnvGuard {
        fn set(value: Option<&str>) -> Self {
            let lock = ENV_LOCK.lock();
            let previous = std::env::var(BACKEND_ENV).ok();
            match value {
                Some(value) => std::env::set_var(BACKEND_ENV, value),
                None => std::env::remove_var(BACKEND_ENV),
            }
            Self {
                previous,
                _lock: lock,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.previous {
                Some(value) => std::env::set_var(BACKEND_ENV, value),
                None => std::env::remove_var(BACKEND_ENV),
            }
        }
    }

    fn configured(backend: &str) -> CacheConfig {
        CacheConfig {
            backend: backend.to_string(),
            ..CacheConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = CacheConfig::from_json_str("{}").unwrap();
        assert_eq!(config.backend, "memory");
        assert!(config.methods.is_empty());
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"backend": "null", "methods": {{"star_count": {{"unless": "growing_fast?"}}}}}}"#
        )
        .unwrap();

        let config = CacheConfig::load(file.path()).unwrap();
        assert_eq!(config.backend, "null");
        assert_eq!(config.methods["star_count"], json!({"unless": "growing_fast?"}));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = CacheConfig::from_json_str(r#"{"adapter": "memory"}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = CacheConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_options_for() {
        let config = CacheConfig::from_json_str(
            r#"{"methods": {"star_count": {"cache_options": {"expires_in": 60}}, "bad": {"unless": 3}}}"#,
        )
        .unwrap();

        let options = config.options_for::<()>("star_count").unwrap();
        assert_eq!(options.cache_options, json!({"expires_in": 60}));
        assert!(config.options_for::<()>("unlisted").is_ok());
        assert!(config.options_for::<()>("bad").is_err());
    }

    #[test]
    fn test_env_overrides_backend() {
        let _env = EnvGuard::set(Some("lru"));
        assert_eq!(configured("memory").with_env_overrides().backend, "lru");
    }

    #[test]
    fn test_env_value_is_trimmed() {
        let _env = EnvGuard::set(Some("  null \n"));
        assert_eq!(configured("memory").with_env_overrides().backend, "null");
    }

    #[test]
    fn test_blank_env_keeps_configured_backend() {
        for blank in ["", "   ", "\t"] {
            let _env = EnvGuard::set(Some(blank));
            assert_eq!(configured("null").with_env_overrides().backend, "null");
        }
    }

    #[test]
    fn test_unset_env_keeps_configured_backend() {
        let _env = EnvGuard::set(None);
        assert_eq!(configured("null").with_env_overrides().backend, "null");
    }

    #[test]
    fn test_apply_unknown_backend() {
        let err = configured("not_configured").apply_backend().unwrap_err();
        match err {
            Error::UnknownBackend { name, expected } => {
                assert_eq!(name, "not_configured");
                assert_eq!(expected, "NotConfiguredBackend");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
