//! Classes, receivers and method resolution
//!
//! A [`Class`] owns two tables: ordinary method bodies, and the interceptor
//! layer where cacheable registrations live. Interceptor routes shadow ordinary
//! bodies for the whole hierarchy below them, and the most derived registration
//! of a name wins. Ordinary bodies resolve from the receiver's own class upward,
//! so overrides are always honored by the uncached path.

use std::collections::HashMap;
use std::fmt;
use std::iter;
use std::sync::Arc;

use ahash::RandomState;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::interceptor::{Interceptor, Registration};
use crate::key::CacheKey;
use crate::names::{DerivedNames, EntryPoint};
use crate::options::CacheableOptions;

/// A method body: `(invocation, args) -> value`
pub type MethodBody<T> = Arc<dyn Fn(&Invocation<'_, T>, &[Value]) -> Result<Value> + Send + Sync>;

/// A named type with a method table, optionally derived from a parent
pub struct Class<T> {
    name: String,
    parent: Option<Arc<Class<T>>>,
    methods: RwLock<HashMap<String, MethodBody<T>, RandomState>>,
    interceptor: Interceptor<T>,
}

impl<T> Class<T>
where
    T: Send + Sync + 'static,
{
    /// Create a root class
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::with_parent(name.into(), None))
    }

    /// Create a class deriving from this one
    pub fn subclass(self: &Arc<Self>, name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::with_parent(name.into(), Some(Arc::clone(self))))
    }

    fn with_parent(name: String, parent: Option<Arc<Class<T>>>) -> Self {
        Self {
            name,
            parent,
            methods: RwLock::new(HashMap::with_hasher(RandomState::new())),
            interceptor: Interceptor::new(),
        }
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent class, if any
    pub fn parent(&self) -> Option<&Arc<Class<T>>> {
        self.parent.as_ref()
    }

    /// Define (or redefine) an ordinary method body
    pub fn define<F>(&self, name: &str, body: F)
    where
        F: Fn(&Invocation<'_, T>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.methods.write().insert(name.to_string(), Arc::new(body));
    }

    /// Make `names` cacheable with shared `options`
    ///
    /// The bodies need not exist yet; they are looked up at call time. Every
    /// name is validated before any is installed.
    pub fn cacheable(&self, names: &[&str], options: CacheableOptions<T>) -> Result<()> {
        options.validate()?;
        let derived = names
            .iter()
            .map(|name| DerivedNames::new(name))
            .collect::<Result<Vec<_>>>()?;

        for names in derived {
            debug!(class = %self.name, method = names.original(), "registering cacheable method");
            self.interceptor.install(Registration::new(names, options.clone()));
        }
        Ok(())
    }

    /// Create an instance receiver
    pub fn instance(self: &Arc<Self>, state: T) -> Object<T> {
        Object {
            class: Arc::clone(self),
            state,
            kind: ReceiverKind::Instance,
        }
    }

    /// Create a class-level receiver identified by the class's own name
    pub fn singleton(self: &Arc<Self>, state: T) -> Object<T> {
        Object {
            class: Arc::clone(self),
            state,
            kind: ReceiverKind::Singleton,
        }
    }

    /// Does any route or body for `name` exist in the hierarchy
    pub fn responds_to(self: &Arc<Self>, name: &str) -> bool {
        self.find_route(name).is_some() || self.find_body(name).is_some()
    }

    /// Names of the cacheable methods registered on this class itself
    pub fn cacheable_methods(&self) -> Vec<String> {
        self.interceptor.registered()
    }

    fn ancestors(self: &Arc<Self>) -> impl Iterator<Item = &Arc<Class<T>>> {
        iter::successors(Some(self), |class| class.parent.as_ref())
    }

    fn find_route(self: &Arc<Self>, name: &str) -> Option<(Arc<Registration<T>>, EntryPoint)> {
        self.ancestors().find_map(|class| class.interceptor.route(name))
    }

    fn find_body(self: &Arc<Self>, name: &str) -> Option<(Arc<Class<T>>, MethodBody<T>)> {
        self.ancestors().find_map(|class| {
            class
                .methods
                .read()
                .get(name)
                .map(|body| (Arc::clone(class), Arc::clone(body)))
        })
    }

    fn find_registration(self: &Arc<Self>, name: &str) -> Option<Arc<Registration<T>>> {
        match self.find_route(name) {
            Some((registration, EntryPoint::Dispatch)) => Some(registration),
            _ => None,
        }
    }
}

impl<T> fmt::Debug for Class<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.as_str()))
            .finish()
    }
}

/// Whether a receiver is an instance or the class itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverKind {
    /// Instance of a class
    Instance,
    /// Class-level receiver
    Singleton,
}

/// A receiver: class reference plus state
pub struct Object<T> {
    class: Arc<Class<T>>,
    state: T,
    kind: ReceiverKind,
}

impl<T> Object<T>
where
    T: Send + Sync + 'static,
{
    /// Receiver state
    pub fn state(&self) -> &T {
        &self.state
    }

    /// Mutable receiver state
    pub fn state_mut(&mut self) -> &mut T {
        &mut self.state
    }

    /// The receiver's class
    pub fn class(&self) -> &Arc<Class<T>> {
        &self.class
    }

    /// Instance or class-level receiver
    pub fn kind(&self) -> ReceiverKind {
        self.kind
    }

    /// Type name of an instance, or the class's own name for a class-level receiver
    pub fn type_name(&self) -> &str {
        self.class.name()
    }

    /// Does `name` resolve on this receiver
    pub fn responds_to(&self, name: &str) -> bool {
        self.class.responds_to(name)
    }

    /// Call `name` with `args`, through the interceptor layer if one claims it
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        if let Some((registration, entry)) = self.class.find_route(name) {
            return registration.invoke(entry, self, args);
        }
        self.call_original(name, args)
    }

    /// Force the cache-or-compute path of cacheable method `name`
    pub fn call_with_cache(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.registration(name)?.with_cache(self, args)
    }

    /// Call the original body of cacheable method `name`, ignoring the cache
    pub fn call_without_cache(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.registration(name)?.without_cache(self, args)
    }

    /// Key that cacheable method `name` would use for `args`
    pub fn cache_key_for(&self, name: &str, args: &[Value]) -> Result<CacheKey> {
        self.registration(name)?.key_for(self, args)
    }

    /// Invalidate the entry of cacheable method `name` for `args`
    pub fn clear_cache(&self, name: &str, args: &[Value]) -> Result<bool> {
        self.registration(name)?.clear_cache(self, args)
    }

    /// Most derived ordinary body for `name`, skipping interceptors
    pub(crate) fn call_original(&self, name: &str, args: &[Value]) -> Result<Value> {
        let (owner, body) = self
            .class
            .find_body(name)
            .ok_or_else(|| self.no_such_method(name))?;

        body(&Invocation::new(self, &owner, name), args)
    }

    fn registration(&self, name: &str) -> Result<Arc<Registration<T>>> {
        self.class
            .find_registration(name)
            .ok_or_else(|| self.no_such_method(name))
    }

    fn no_such_method(&self, name: &str) -> Error {
        Error::NoSuchMethod {
            receiver: self.to_string(),
            method: name.to_string(),
        }
    }
}

impl<T> fmt::Display for Object<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ReceiverKind::Instance => write!(f, "an instance of {}", self.class.name),
            ReceiverKind::Singleton => write!(f, "{}:Class", self.class.name),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Object<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class.name)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .finish()
    }
}

/// Context of a running method body
pub struct Invocation<'a, T> {
    receiver: &'a Object<T>,
    owner: &'a Arc<Class<T>>,
    method: &'a str,
}

impl<'a, T> Invocation<'a, T>
where
    T: Send + Sync + 'static,
{
    fn new(receiver: &'a Object<T>, owner: &'a Arc<Class<T>>, method: &'a str) -> Self {
        Self {
            receiver,
            owner,
            method,
        }
    }

    /// The receiver
    pub fn receiver(&self) -> &'a Object<T> {
        self.receiver
    }

    /// Receiver state
    pub fn state(&self) -> &'a T {
        self.receiver.state()
    }

    /// Name the body was invoked under
    pub fn method_name(&self) -> &str {
        self.method
    }

    /// Class that defined the running body
    pub fn owner(&self) -> &Arc<Class<T>> {
        self.owner
    }

    /// Send `name` to the receiver
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.receiver.call(name, args)
    }

    /// Call the next body for this method above the defining class
    pub fn call_super(&self, args: &[Value]) -> Result<Value> {
        let parent = self
            .owner
            .parent
            .as_ref()
            .ok_or_else(|| self.receiver.no_such_method(self.method))?;

        let (owner, body) = parent
            .find_body(self.method)
            .ok_or_else(|| self.receiver.no_such_method(self.method))?;

        body(&Invocation::new(self.receiver, &owner, self.method), args)
    }
}
