//! Error types for search construction

use thiserror::Error;

/// Errors that can occur while building a search.
///
/// Searching itself never fails: missing fields, empty collections and
/// non-matching queries all degrade to empty result sets.
#[derive(Debug, Error)]
pub enum Error {
    /// An option value is out of range
    #[error("invalid option '{option}': {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },

    /// A key or recursion path cannot be used
    #[error("invalid key '{path}': {reason}")]
    InvalidKey { path: String, reason: String },

    /// Options or items could not be parsed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn option(option: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option,
            reason: reason.into(),
        }
    }

    pub(crate) fn key(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for search construction.
pub type Result<T> = std::result::Result<T, Error>;
