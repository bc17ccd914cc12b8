//! HTTP Cache - a client-side HTTP response cache
//!
//! Serves fresh responses from memory, stores successful GET responses with a
//! TTL, and supports pattern invalidation and full clears.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;

pub use api::ApiClient;
pub use cache::{CacheKey, KeyPattern, SharedCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use pipeline::{CachePipeline, CachePolicy};
