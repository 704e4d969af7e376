//! Per-call cache bypass decision

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::class::Object;
use crate::error::Result;
use crate::names::validate_method_name;

/// Predicate: `(receiver, method name, args) -> skip caching?`
pub type Predicate<T> = Arc<dyn Fn(&Object<T>, &str, &[Value]) -> Result<bool> + Send + Sync>;

/// The `unless` option
pub enum Unless<T> {
    /// Never skip the cache
    Never,
    /// Direct predicate
    Predicate(Predicate<T>),
    /// Predicate method on the receiver, looked up by name at call time and
    /// called with `[method name, args]`
    Method(String),
}

impl<T> Unless<T>
where
    T: Send + Sync + 'static,
{
    /// Wrap a closure as a direct predicate
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&Object<T>, &str, &[Value]) -> Result<bool> + Send + Sync + 'static,
    {
        Unless::Predicate(Arc::new(predicate))
    }

    /// Refer to a predicate method by name
    pub fn method(name: impl Into<String>) -> Self {
        Unless::Method(name.into())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Unless::Method(name) => validate_method_name(name),
            _ => Ok(()),
        }
    }

    /// Decide whether this call skips the cache
    pub fn should_bypass(&self, receiver: &Object<T>, method: &str, args: &[Value]) -> Result<bool> {
        match self {
            Unless::Never => Ok(false),
            Unless::Predicate(predicate) => predicate(receiver, method, args),
            Unless::Method(name) => {
                let verdict = receiver.call(name, &[Value::from(method), Value::Array(args.to_vec())])?;
                Ok(truthy(&verdict))
            }
        }
    }
}

/// `null` and `false` are falsy, everything else is truthy
pub fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

impl<T> Default for Unless<T> {
    fn default() -> Self {
        Unless::Never
    }
}

impl<T> Clone for Unless<T> {
    fn clone(&self) -> Self {
        match self {
            Unless::Never => Unless::Never,
            Unless::Predicate(p) => Unless::Predicate(Arc::clone(p)),
            Unless::Method(name) => Unless::Method(name.clone()),
        }
    }
}

impl<T> fmt::Debug for Unless<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unless::Never => write!(f, "Never"),
            Unless::Predicate(_) => write!(f, "Predicate(<fn>)"),
            Unless::Method(name) => f.debug_tuple("Method").field(name).finish(),
        }
    }
}
