//! HTTP Module
//!
//! Request and response types plus the transport the cache wraps.

mod request;
mod response;
mod transport;

pub use request::Request;
pub use response::Response;
pub use transport::{ReqwestTransport, StatusError, Transport};

// Re-exported so callers need no direct dependency on `http`
pub use ::http::{header, HeaderMap, Method, StatusCode};
