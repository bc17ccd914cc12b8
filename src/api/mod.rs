//! API Module
//!
//! Named endpoint operations on top of the cache pipeline.

mod endpoints;

pub use endpoints::{
    ApiClient, INSTITUTIONS_PATH, INSTITUTIONS_TTL, RESOURCES_PATH, RESOURCES_TTL,
};
