//! Cache keys and key formatting
//!
//! The default formatter ignores call arguments: the key is
//! `[identity, method]`, where identity comes from a `cache_key` method on the
//! receiver if it has one and from the receiver's type name otherwise.
//! Argument-sensitive keys need a custom formatter.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::class::Object;
use crate::error::Result;

/// Method consulted by the default formatter for a receiver's own identity
pub const CACHE_KEY_METHOD: &str = "cache_key";

/// Structural cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// Absent component
    Nil,
    /// Boolean component
    Bool(bool),
    /// Signed integer component
    Int(i64),
    /// Unsigned integer component beyond `i64::MAX`
    UInt(u64),
    /// Floating point component, held as its bit pattern
    Float(u64),
    /// Text component
    Str(String),
    /// Ordered composite
    List(Vec<CacheKey>),
    /// String-keyed composite, entries in key order
    Map(Vec<(String, CacheKey)>),
}

impl CacheKey {
    /// Build a composite key from parts
    pub fn list<I, K>(parts: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<CacheKey>,
    {
        CacheKey::List(parts.into_iter().map(Into::into).collect())
    }

    /// Floating point component; `-0.0` and `0.0` are the same key
    pub fn float(f: f64) -> Self {
        let f = if f == 0.0 { 0.0 } else { f };
        CacheKey::Float(f.to_bits())
    }

    /// Is this the `Nil` key
    pub fn is_nil(&self) -> bool {
        matches!(self, CacheKey::Nil)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Nil => write!(f, "nil"),
            CacheKey::Bool(b) => write!(f, "{}", b),
            CacheKey::Int(i) => write!(f, "{}", i),
            CacheKey::UInt(u) => write!(f, "{}", u),
            CacheKey::Float(bits) => write!(f, "{:?}", f64::from_bits(*bits)),
            CacheKey::Str(s) => write!(f, "{:?}", s),
            CacheKey::List(parts) => {
                write!(f, "[")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", part)?;
                }
                write!(f, "]")
            }
            CacheKey::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        CacheKey::Str(s.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        CacheKey::Str(s)
    }
}

impl From<i64> for CacheKey {
    fn from(i: i64) -> Self {
        CacheKey::Int(i)
    }
}

impl From<bool> for CacheKey {
    fn from(b: bool) -> Self {
        CacheKey::Bool(b)
    }
}

impl From<Vec<CacheKey>> for CacheKey {
    fn from(parts: Vec<CacheKey>) -> Self {
        CacheKey::List(parts)
    }
}

impl From<&Value> for CacheKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => CacheKey::Nil,
            Value::Bool(b) => CacheKey::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CacheKey::Int(i)
                } else if let Some(u) = n.as_u64() {
                    CacheKey::UInt(u)
                } else {
                    CacheKey::float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => CacheKey::Str(s.clone()),
            Value::Array(items) => CacheKey::List(items.iter().map(CacheKey::from).collect()),
            // serde_json maps iterate in key order
            Value::Object(map) => CacheKey::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), CacheKey::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for CacheKey {
    fn from(value: Value) -> Self {
        CacheKey::from(&value)
    }
}

impl From<CacheKey> for Value {
    fn from(key: CacheKey) -> Self {
        match key {
            CacheKey::Nil => Value::Null,
            CacheKey::Bool(b) => Value::Bool(b),
            CacheKey::Int(i) => Value::from(i),
            CacheKey::UInt(u) => Value::from(u),
            CacheKey::Float(bits) => Value::from(f64::from_bits(bits)),
            CacheKey::Str(s) => Value::String(s),
            CacheKey::List(parts) => Value::Array(parts.into_iter().map(Value::from).collect()),
            CacheKey::Map(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Key formatter: `(receiver, method name, args) -> key`
pub type KeyFormat<T> = Arc<dyn Fn(&Object<T>, &str, &[Value]) -> Result<CacheKey> + Send + Sync>;

/// Default key: `[identity, method]`, arguments excluded
pub fn default_key_format<T>(receiver: &Object<T>, method: &str, _args: &[Value]) -> Result<CacheKey>
where
    T: Send + Sync + 'static,
{
    let identity = if receiver.responds_to(CACHE_KEY_METHOD) {
        CacheKey::from(receiver.call(CACHE_KEY_METHOD, &[])?)
    } else {
        CacheKey::from(receiver.type_name())
    };

    let mut parts = Vec::with_capacity(2);
    if !identity.is_nil() {
        parts.push(identity);
    }
    parts.push(CacheKey::from(method));
    Ok(CacheKey::List(parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_value() {
        let key = CacheKey::from(json!(["GitHubApi", "star_count", 3, null, true]));
        assert_eq!(
            key,
            CacheKey::List(vec![
                "GitHubApi".into(),
                "star_count".into(),
                CacheKey::Int(3),
                CacheKey::Nil,
                CacheKey::Bool(true),
            ])
        );
    }

    #[test]
    fn test_object_keys_are_ordered() {
        let a = CacheKey::from(json!({"b": 1, "a": 2}));
        let b = CacheKey::from(json!({"a": 2, "b": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn test_number_kinds() {
        assert_eq!(CacheKey::from(json!(-3)), CacheKey::Int(-3));
        assert_eq!(CacheKey::from(json!(u64::MAX)), CacheKey::UInt(u64::MAX));
        assert_eq!(CacheKey::from(json!(1.5)), CacheKey::float(1.5));
        assert_eq!(CacheKey::float(-0.0), CacheKey::float(0.0));
    }

    #[test]
    fn test_different_kinds_never_collide() {
        let pairs = [
            (json!(1.5), json!("1.5")),
            (json!(u64::MAX), json!(u64::MAX.to_string())),
            (json!({"a": 1}), json!([["a", 1]])),
            (json!(1), json!(1.0)),
            (json!(1), json!("1")),
            (json!(true), json!("true")),
            (json!(null), json!("nil")),
            (json!({}), json!([])),
        ];

        for (a, b) in pairs {
            assert_ne!(CacheKey::from(&a), CacheKey::from(&b), "{a} and {b} share a key");
        }
    }

    #[test]
    fn test_back_to_value_keeps_kinds() {
        for value in [
            json!(1.5),
            json!(u64::MAX),
            json!(-7),
            json!({"a": [1, "b"], "c": null}),
            json!([["a", 1]]),
        ] {
            assert_eq!(Value::from(CacheKey::from(&value)), value);
        }
    }

    #[test]
    fn test_into_value() {
        let key = CacheKey::list(["GitHubApi", "star_count"]);
        assert_eq!(Value::from(key), json!(["GitHubApi", "star_count"]));
    }

    #[test]
    fn test_display() {
        let key = CacheKey::List(vec!["Repo".into(), CacheKey::Int(7), CacheKey::Nil]);
        assert_eq!(key.to_string(), r#"["Repo", 7, nil]"#);

        let key = CacheKey::from(json!({"n": 1.5, "s": "1.5"}));
        assert_eq!(key.to_string(), r#"{"n": 1.5, "s": "1.5"}"#);
    }
}
