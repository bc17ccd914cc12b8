//! Per-request cache policy.

use std::time::Duration;

// == Cache Policy ==
/// Whether a request may be served from or stored in the cache, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Only idempotent reads should be marked cacheable
    pub cacheable: bool,
    /// TTL for the stored response; `None` uses the configured default
    pub ttl: Option<Duration>,
}

impl CachePolicy {
    /// Cacheable with the configured default TTL.
    pub const fn cached() -> Self {
        Self {
            cacheable: true,
            ttl: None,
        }
    }

    /// Cacheable with an explicit TTL.
    pub const fn cached_for(ttl: Duration) -> Self {
        Self {
            cacheable: true,
            ttl: Some(ttl),
        }
    }

    /// Always go to the transport; never read or write the cache.
    pub const fn bypass() -> Self {
        Self {
            cacheable: false,
            ttl: None,
        }
    }

    /// Returns the TTL to use, falling back to `default`.
    pub fn resolve_ttl(&self, default: Duration) -> Duration {
        self.ttl.unwrap_or(default)
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::cached()
    }
}
