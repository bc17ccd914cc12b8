//! Pipeline Module
//!
//! Puts the response cache in front of a transport.

mod dispatch;
mod policy;

pub use dispatch::CachePipeline;
pub use policy::CachePolicy;
