//! Interception layer: the five generated operations of a cacheable method

use std::collections::HashMap;
use std::sync::Arc;

use ahash::RandomState;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, trace};

use crate::backend;
use crate::bypass::Unless;
use crate::class::Object;
use crate::error::Result;
use crate::key::{default_key_format, CacheKey, KeyFormat};
use crate::names::{DerivedNames, EntryPoint};
use crate::options::CacheableOptions;

/// One cacheable method on one class
pub(crate) struct Registration<T> {
    names: DerivedNames,
    unless: Unless<T>,
    key_format: KeyFormat<T>,
    cache_options: Value,
}

impl<T> Registration<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(names: DerivedNames, options: CacheableOptions<T>) -> Self {
        let key_format: KeyFormat<T> = match options.key_format {
            Some(format) => format,
            None => Arc::new(default_key_format::<T>),
        };

        Self {
            names,
            unless: options.unless,
            key_format,
            cache_options: options.cache_options,
        }
    }

    pub(crate) fn invoke(&self, entry: EntryPoint, receiver: &Object<T>, args: &[Value]) -> Result<Value> {
        match entry {
            EntryPoint::Dispatch => self.dispatch(receiver, args),
            EntryPoint::WithCache => self.with_cache(receiver, args),
            EntryPoint::WithoutCache => self.without_cache(receiver, args),
            EntryPoint::KeyFormat => self.key_for(receiver, args).map(Value::from),
            EntryPoint::ClearCache => self.clear_cache(receiver, args).map(Value::Bool),
        }
    }

    fn dispatch(&self, receiver: &Object<T>, args: &[Value]) -> Result<Value> {
        let method = self.names.original();
        if self.unless.should_bypass(receiver, method, args)? {
            debug!(receiver = %receiver, method, "cache bypassed");
            return self.without_cache(receiver, args);
        }
        self.with_cache(receiver, args)
    }

    pub(crate) fn with_cache(&self, receiver: &Object<T>, args: &[Value]) -> Result<Value> {
        let key = self.key_for(receiver, args)?;
        // The backend is read per call so a swap affects every registration
        let backend = backend::get_backend();
        trace!(backend = backend.name(), key = %key, "cache fetch");

        backend.fetch(&key, &self.cache_options, &mut || self.without_cache(receiver, args))
    }

    pub(crate) fn without_cache(&self, receiver: &Object<T>, args: &[Value]) -> Result<Value> {
        receiver.call_original(self.names.original(), args)
    }

    pub(crate) fn key_for(&self, receiver: &Object<T>, args: &[Value]) -> Result<CacheKey> {
        (self.key_format)(receiver, self.names.original(), args)
    }

    pub(crate) fn clear_cache(&self, receiver: &Object<T>, args: &[Value]) -> Result<bool> {
        let key = self.key_for(receiver, args)?;
        let backend = backend::get_backend();
        trace!(backend = backend.name(), key = %key, "cache delete");

        Ok(backend.delete(&key))
    }
}

/// Route table: every generated name maps to its registration and entry point
type Routes<T> = HashMap<String, (Arc<Registration<T>>, EntryPoint), RandomState>;

/// Per-class interceptor layer
pub(crate) struct Interceptor<T> {
    routes: RwLock<Routes<T>>,
}

impl<T> Interceptor<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::with_hasher(RandomState::new())),
        }
    }

    /// Install (or replace) all five routes of a registration under one lock
    pub(crate) fn install(&self, registration: Registration<T>) {
        let registration = Arc::new(registration);
        let mut routes = self.routes.write();

        for (name, entry) in registration.names.routes() {
            routes.insert(name.to_string(), (Arc::clone(&registration), entry));
        }
    }

    pub(crate) fn route(&self, name: &str) -> Option<(Arc<Registration<T>>, EntryPoint)> {
        self.routes
            .read()
            .get(name)
            .map(|(registration, entry)| (Arc::clone(registration), *entry))
    }

    pub(crate) fn registered(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .routes
            .read()
            .iter()
            .filter(|(_, (_, entry))| *entry == EntryPoint::Dispatch)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}
