//! Error types with actionable diagnostics.
//!
//! Structural and configuration errors (usage, stale cache) are fatal and
//! abort the whole run; data-completeness issues are reported as warnings
//! (see [`crate::record::CompletenessWarning`]) and never abort.

use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for perfilar operations.
pub type Result<T> = std::result::Result<T, PerfilarError>;

/// Errors that can occur during benchmark post-processing.
#[derive(Error, Debug)]
pub enum PerfilarError {
    /// Invalid invocation arguments or malformed input records.
    #[error("Usage error: {message}")]
    Usage { message: String },

    /// The persisted target cache was computed for a different algorithm set.
    ///
    /// The requested set must be a subset of the cached set; anything else
    /// would silently compare against a mismatched baseline.
    #[error(
        "Stale target cache at {path}: cached algorithm set {cached:?} \
         is not a superset of the requested set {requested:?}\n  \
         → Delete the cache file to recompute targets for the new set"
    )]
    StaleCache {
        path: PathBuf,
        cached: BTreeSet<String>,
        requested: BTreeSet<String>,
    },

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Target-cache snapshot could not be encoded or decoded.
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl PerfilarError {
    /// Create a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage { message: message.into() }
    }

    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }
}

impl From<serde_json::Error> for PerfilarError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization { message: err.to_string() }
    }
}
