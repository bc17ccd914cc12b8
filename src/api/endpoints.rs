//! Named API operations and their cache policies.

use std::fmt::Display;
use std::time::Duration;

use serde_json::Value;

use crate::cache::{KeyPattern, ParamValue};
use crate::error::Result;
use crate::http::header::{HeaderValue, CONTENT_TYPE};
use crate::http::{Request, Response, Transport};
use crate::pipeline::{CachePipeline, CachePolicy};

// == Endpoint Paths ==
pub const INSTITUTIONS_PATH: &str = "/api/institutions";
pub const RESOURCES_PATH: &str = "/api/resources";

// == TTL Policy ==
/// Institutions change rarely
pub const INSTITUTIONS_TTL: Duration = Duration::from_secs(10 * 60);
pub const RESOURCES_TTL: Duration = Duration::from_secs(2 * 60);

// == API Client ==
/// Named operations over a cache pipeline.
///
/// Holds no state of its own; each method only picks the target, parameters
/// and cache policy.
#[derive(Debug)]
pub struct ApiClient<T> {
    pipeline: CachePipeline<T>,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(pipeline: CachePipeline<T>) -> Self {
        Self { pipeline }
    }

    /// GET /api/institutions, cached for 10 minutes.
    pub async fn list_institutions<I, K, V>(&self, params: I) -> Result<Response>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        let request = Request::get(INSTITUTIONS_PATH).params(params);
        self.pipeline
            .dispatch(request, CachePolicy::cached_for(INSTITUTIONS_TTL))
            .await
    }

    /// GET /api/institutions/{id}, cached for 10 minutes.
    pub async fn get_institution(&self, id: impl Display) -> Result<Response> {
        let request = Request::get(format!("{}/{}", INSTITUTIONS_PATH, id));
        self.pipeline
            .dispatch(request, CachePolicy::cached_for(INSTITUTIONS_TTL))
            .await
    }

    /// GET /api/resources, cached for 2 minutes.
    pub async fn list_resources<I, K, V>(&self, params: I) -> Result<Response>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        let request = Request::get(RESOURCES_PATH).params(params);
        self.pipeline
            .dispatch(request, CachePolicy::cached_for(RESOURCES_TTL))
            .await
    }

    /// GET /api/resources/{id}, cached for 2 minutes.
    pub async fn get_resource(&self, id: impl Display) -> Result<Response> {
        let request = Request::get(format!("{}/{}", RESOURCES_PATH, id));
        self.pipeline
            .dispatch(request, CachePolicy::cached_for(RESOURCES_TTL))
            .await
    }

    /// POST /api/resources. Never cached.
    pub async fn create_resource(&self, body: &Value) -> Result<Response> {
        let request = Request::post(RESOURCES_PATH)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body.to_string());
        self.pipeline.dispatch(request, CachePolicy::bypass()).await
    }

    /// Drops every cached response.
    pub async fn clear_cache(&self) -> usize {
        self.pipeline.clear_all().await
    }

    /// Drops cached responses matching `pattern`, or all of them for `None`.
    pub async fn invalidate(&self, pattern: Option<&KeyPattern>) -> usize {
        self.pipeline.invalidate(pattern).await
    }

    pub fn pipeline(&self) -> &CachePipeline<T> {
        &self.pipeline
    }
}
