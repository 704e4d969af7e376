//! Registration options

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::bypass::Unless;
use crate::class::Object;
use crate::error::{Error, Result};
use crate::key::{CacheKey, KeyFormat};

/// Options shared by every method named in one `cacheable` call
pub struct CacheableOptions<T> {
    pub(crate) unless: Unless<T>,
    pub(crate) key_format: Option<KeyFormat<T>>,
    pub(crate) cache_options: Value,
}

impl<T> CacheableOptions<T>
where
    T: Send + Sync + 'static,
{
    /// No bypass, default key format, no backend options
    pub fn new() -> Self {
        Self {
            unless: Unless::Never,
            key_format: None,
            cache_options: Value::Null,
        }
    }

    /// Skip the cache when `predicate` returns true
    pub fn unless<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Object<T>, &str, &[Value]) -> Result<bool> + Send + Sync + 'static,
    {
        self.unless = Unless::when(predicate);
        self
    }

    /// Skip the cache when the receiver's method `name` returns a truthy value
    pub fn unless_method(mut self, name: impl Into<String>) -> Self {
        self.unless = Unless::method(name);
        self
    }

    /// Set the bypass option directly
    pub fn with_unless(mut self, unless: Unless<T>) -> Self {
        self.unless = unless;
        self
    }

    /// Compute keys with `format` instead of the default formatter
    pub fn key_format<F>(mut self, format: F) -> Self
    where
        F: Fn(&Object<T>, &str, &[Value]) -> Result<CacheKey> + Send + Sync + 'static,
    {
        self.key_format = Some(Arc::new(format));
        self
    }

    /// Opaque value handed to the backend on every fetch
    pub fn cache_options(mut self, options: Value) -> Self {
        self.cache_options = options;
        self
    }

    /// Build options from a declarative JSON object
    ///
    /// Recognized keys: `unless` (a method name) and `cache_options` (any value).
    /// A `key_format` entry is rejected since formatters are closures.
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = match value {
            Value::Null => return Ok(Self::new()),
            Value::Object(map) => map,
            other => {
                return Err(Error::Config(format!(
                    "cacheable options must be an object, got {}",
                    other
                )))
            }
        };

        let mut options = Self::new();
        for (option, setting) in map {
            match option.as_str() {
                "unless" => {
                    options.unless = match setting {
                        Value::Null => Unless::Never,
                        Value::String(name) => Unless::method(name.clone()),
                        other => {
                            return Err(Error::invalid_option(
                                "unless",
                                format!("expected a predicate method name, got {}", other),
                            ))
                        }
                    }
                }
                "key_format" if !setting.is_null() => {
                    return Err(Error::invalid_option(
                        "key_format",
                        "must be a callable and cannot be given declaratively",
                    ))
                }
                "key_format" => {}
                "cache_options" => options.cache_options = setting.clone(),
                unknown => return Err(Error::invalid_option(unknown, "unrecognized option")),
            }
        }

        options.validate()?;
        Ok(options)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match &self.unless {
            Unless::Method(name) => self
                .unless
                .validate()
                .map_err(|_| Error::invalid_option("unless", format!("`{}` is not a method name", name))),
            _ => Ok(()),
        }
    }
}

impl<T> Default for CacheableOptions<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for CacheableOptions<T> {
    fn clone(&self) -> Self {
        Self {
            unless: self.unless.clone(),
            key_format: self.key_format.clone(),
            cache_options: self.cache_options.clone(),
        }
    }
}

impl<T> fmt::Debug for CacheableOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheableOptions")
            .field("unless", &self.unless)
            .field("key_format", &self.key_format.as_ref().map(|_| "<fn>"))
            .field("cache_options", &self.cache_options)
            .finish()
    }
}
