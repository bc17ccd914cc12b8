//! Error types for the response cache
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and the pipeline around it.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Request target or parameters cannot be encoded into a key
    #[error("Invalid key input: {0}")]
    InvalidKeyInput(String),

    /// A TTL of zero was supplied where a positive duration is required
    #[error("Invalid TTL: {0:?} (must be greater than zero)")]
    InvalidTtl(Duration),

    /// Invalidation pattern is not a valid regular expression
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Failure reported by the transport, carried unchanged
    #[error("Transport failure: {0}")]
    Transport(#[source] anyhow::Error),
}

impl CacheError {
    /// Returns the transport error if this is a transport failure.
    pub fn as_transport(&self) -> Option<&anyhow::Error> {
        match self {
            CacheError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
