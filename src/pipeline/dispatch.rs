//! Cache-aware request dispatch.
//!
//! Per request: `NotStarted -> KeyComputed -> CacheHit`, or
//! `KeyComputed -> CacheMiss -> TransportInFlight -> CachePopulated | TransportFailed`.
//! Requests that are not cacheable skip straight to the transport.

use std::time::Duration;

use tracing::{debug, trace};

use super::CachePolicy;
use crate::cache::{CacheKey, CacheStats, KeyPattern, SharedCache};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::http::{Method, Request, Response, Transport};

/// Key and TTL worked out before the request is handed to the transport.
#[derive(Debug)]
struct RequestContext {
    key: CacheKey,
    ttl: Duration,
}

// == Cache Pipeline ==
/// Wraps a transport with a response cache.
///
/// The store lock is only held for individual lookups and writes, never while
/// the transport is in flight. Concurrent misses for the same key each reach
/// the transport; there is no request coalescing.
#[derive(Debug)]
pub struct CachePipeline<T> {
    transport: T,
    cache: SharedCache,
    config: CacheConfig,
}

impl<T: Transport> CachePipeline<T> {
    // == Constructor ==
    /// Creates a pipeline over `transport` backed by `cache`.
    ///
    /// # Arguments
    /// * `transport` - Performs the real network calls
    /// * `cache` - Store shared with anything else that needs to invalidate it
    /// * `config` - Default TTL and the global on/off switch
    pub fn new(transport: T, cache: SharedCache, config: CacheConfig) -> Self {
        Self {
            transport,
            cache,
            config,
        }
    }

    /// Creates a pipeline with a fresh cache and default configuration.
    pub fn with_defaults(transport: T) -> Self {
        Self::new(transport, SharedCache::new(), CacheConfig::default())
    }

    // == Dispatch ==
    /// Sends `request`, answering from the cache when `policy` allows.
    ///
    /// Only successful transport responses are stored. A transport error is
    /// returned as `CacheError::Transport` holding the original error.
    ///
    /// # Errors
    /// - `InvalidTtl` if the policy resolves to a zero TTL
    /// - `InvalidKeyInput` if the request cannot be keyed
    /// - `Transport` on transport failure
    pub async fn dispatch(&self, request: Request, policy: CachePolicy) -> Result<Response> {
        let context = match self.prepare(&request, policy)? {
            Some(context) => context,
            None => {
                trace!("Bypassing cache for {} {}", request.method(), request.target());
                return self.send(request).await;
            }
        };

        if let Some(cached) = self.cache.get(&context.key).await {
            debug!("Cache hit for {}", context.key);
            return Ok(cached);
        }

        debug!("Cache miss for {}", context.key);
        let response = match self.send(request).await {
            Ok(response) => response,
            Err(err) => {
                debug!("Transport failed for {}, not caching", context.key);
                return Err(err);
            }
        };

        self.cache
            .set(context.key.clone(), response.clone(), context.ttl)
            .await?;
        debug!("Cached {} for {:?}", context.key, context.ttl);

        Ok(response)
    }

    /// Returns the cache context, or `None` when the cache must be skipped.
    fn prepare(&self, request: &Request, policy: CachePolicy) -> Result<Option<RequestContext>> {
        if !self.config.enabled || !policy.cacheable {
            return Ok(None);
        }

        // Keys ignore the method, so only GET may share them.
        if request.method() != Method::GET {
            debug!(
                "Ignoring cacheable policy for non-GET {} {}",
                request.method(),
                request.target()
            );
            return Ok(None);
        }

        // Same rule as `CacheStore::set`: zero is rejected, anything else is
        // stored for at least 1 ms.
        let ttl = policy.resolve_ttl(self.config.default_ttl);
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl(ttl));
        }

        let key = request.cache_key()?;
        trace!("Key computed: {}", key);
        Ok(Some(RequestContext { key, ttl }))
    }

    async fn send(&self, request: Request) -> Result<Response> {
        self.transport
            .send(request)
            .await
            .map_err(CacheError::Transport)
    }

    // == Administration ==
    /// Drops every cached response, e.g. on logout.
    pub async fn clear_all(&self) -> usize {
        self.cache.clear().await
    }

    /// Drops cached responses matching `pattern`, or all of them for `None`.
    pub async fn invalidate(&self, pattern: Option<&KeyPattern>) -> usize {
        self.cache.invalidate(pattern).await
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}
