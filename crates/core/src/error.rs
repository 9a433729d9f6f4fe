//! Error types for docnav
//!
//! This module defines the error taxonomy shared by the search and navigation
//! crates. We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! Only [`Error::NavigationDescriptor`] and [`Error::Config`] are meant to
//! reach a caller as hard failures. Shard load and malformed entry errors are
//! recovered where they occur and surface as flags on a result set.

use crate::shard_key::ShardKey;
use std::io;
use thiserror::Error;

/// Result type alias for docnav operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for docnav
#[derive(Debug, Error)]
pub enum Error {
    /// A shard (or the shard manifest) is missing, unreachable or malformed
    #[error("Failed to load shard '{shard}': {reason}")]
    ShardLoad {
        /// Shard that failed; the empty key stands for the manifest
        shard: ShardKey,
        /// Human readable cause
        reason: String,
    },

    /// A single record inside an otherwise readable shard failed to parse
    #[error("Malformed entry {index} in shard '{shard}': {reason}")]
    MalformedEntry {
        /// Shard containing the record
        shard: ShardKey,
        /// Position of the record in the shard
        index: usize,
        /// Human readable cause
        reason: String,
    },

    /// The navigation descriptor is missing or invalid
    #[error("Invalid navigation descriptor: {0}")]
    NavigationDescriptor(String),

    /// Configuration file could not be read or holds invalid values
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Build a shard load error
    pub fn shard_load(shard: ShardKey, reason: impl Into<String>) -> Self {
        Error::ShardLoad {
            shard,
            reason: reason.into(),
        }
    }

    /// Build a malformed entry error
    pub fn malformed(shard: ShardKey, index: usize, reason: impl Into<String>) -> Self {
        Error::MalformedEntry {
            shard,
            index,
            reason: reason.into(),
        }
    }

    /// Build a navigation descriptor error
    pub fn navigation(reason: impl Into<String>) -> Self {
        Error::NavigationDescriptor(reason.into())
    }

    /// Whether the error only degrades a query instead of failing it
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ShardLoad { .. } | Error::MalformedEntry { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_shard_load() {
        let err = Error::shard_load(ShardKey::new("ba"), "not found");
        let msg = err.to_string();
        assert!(msg.contains("Failed to load shard"));
        assert!(msg.contains("'ba'"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_error_display_malformed_entry() {
        let err = Error::malformed(ShardKey::new("b"), 7, "expected array");
        let msg = err.to_string();
        assert!(msg.contains("Malformed entry 7"));
        assert!(msg.contains("expected array"));
    }

    #[test]
    fn test_error_display_navigation() {
        let err = Error::navigation("no root");
        assert!(err.to_string().contains("Invalid navigation descriptor"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<Vec<u32>>("[1,").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::shard_load(ShardKey::new("a"), "x").is_recoverable());
        assert!(Error::malformed(ShardKey::new("a"), 0, "x").is_recoverable());
        assert!(!Error::navigation("x").is_recoverable());
        assert!(!Error::Config("x".into()).is_recoverable());
    }
}
