//! Error types for cacheable

use std::io;

use thiserror::Error;

/// Result type alias for cacheable operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for registration, dispatch and backend selection
#[derive(Debug, Error)]
pub enum Error {
    /// A registration option has the wrong shape
    #[error("invalid option `{option}`: {reason}")]
    InvalidOption {
        /// Option key (`unless`, `key_format`, ...)
        option: String,
        /// What was wrong with it
        reason: String,
    },

    /// A method name cannot be used to derive entry point names
    #[error("invalid method name `{0}`")]
    InvalidMethodName(String),

    /// A backend name did not resolve to a registered backend type
    #[error("unknown cache backend `{name}`: no backend type named `{expected}`")]
    UnknownBackend {
        /// Name as given by the caller
        name: String,
        /// Type name derived from it
        expected: String,
    },

    /// No implementation reachable for a method at call time
    #[error("undefined method `{method}` for {receiver}")]
    NoSuchMethod {
        /// Receiver description
        receiver: String,
        /// Method name looked up
        method: String,
    },

    /// Malformed configuration document
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON error while reading configuration
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error raised by a method body, key formatter or bypass predicate
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn invalid_option(option: &str, reason: impl Into<String>) -> Self {
        Error::InvalidOption {
            option: option.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true for errors raised at registration or backend selection time
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidOption { .. }
                | Error::InvalidMethodName(_)
                | Error::UnknownBackend { .. }
                | Error::Config(_)
        )
    }
}
