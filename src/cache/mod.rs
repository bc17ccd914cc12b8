//! Cache Module
//!
//! Provides in-memory response caching with TTL expiration and pattern
//! invalidation.

mod clock;
mod entry;
mod key;
mod pattern;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use key::{params_from_json, CacheKey, ParamValue, KEY_SEPARATOR};
pub use pattern::KeyPattern;
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::CacheStore;
