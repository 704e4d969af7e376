//! # cacheable
//!
//! Method-level memoization over a pluggable key-value store.
//!
//! Declaring a method cacheable on a [`Class`] generates four companions next
//! to it and turns the public name into a dispatcher:
//!
//! | Name | Effect |
//! |---|---|
//! | `foo` | bypass check, then cache-or-compute |
//! | `foo_with_cache` | cache-or-compute |
//! | `foo_without_cache` | original body |
//! | `foo_key_format` | cache key for the arguments |
//! | `clear_foo_cache` | delete the entry for the arguments |
//!
//! ```
//! use cacheable::{json, CacheableOptions, Class};
//!
//! let api = Class::<()>::new("GitHubApi");
//! api.cacheable(&["star_count"], CacheableOptions::new()).unwrap();
//! api.define("star_count", |_, _| Ok(json!(19)));
//!
//! let client = api.instance(());
//! assert_eq!(client.call("star_count", &[]).unwrap(), json!(19));
//! assert_eq!(client.call("star_count_key_format", &[]).unwrap(), json!(["GitHubApi", "star_count"]));
//! assert_eq!(client.call("clear_star_count_cache", &[]).unwrap(), json!(true));
//! ```
//!
//! Results are stored in the process-wide backend chosen with
//! [`set_backend`] (`"memory"` unless changed).

#![warn(missing_docs)]

pub mod backend;
mod bypass;
mod class;
mod config;
mod error;
mod interceptor;
mod key;
mod names;
mod options;

pub use backend::{get_backend, set_backend, CacheBackend, MemoryBackend, NullBackend};
pub use bypass::{truthy, Predicate, Unless};
pub use class::{Class, Invocation, MethodBody, Object, ReceiverKind};
pub use config::{CacheConfig, BACKEND_ENV};
pub use error::{Error, Result};
pub use key::{default_key_format, CacheKey, KeyFormat, CACHE_KEY_METHOD};
pub use names::{validate_method_name, DerivedNames, EntryPoint};
pub use options::CacheableOptions;
pub use serde_json::{json, Value};
