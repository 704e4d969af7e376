//! # cacheable-lru
//!
//! Bounded LRU backend for `cacheable`.
//!
//! ```
//! use cacheable::{get_backend, set_backend};
//!
//! cacheable_lru::install(256);
//! set_backend("lru").unwrap();
//! assert_eq!(get_backend().name(), "lru");
//! ```

#![warn(missing_docs)]

mod backend;
mod lru;

pub use backend::{install, LruBackend, DEFAULT_CAPACITY};
