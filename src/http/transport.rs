//! Transport seam and the reqwest-backed implementation.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use http::StatusCode;
use reqwest::Url;
use thiserror::Error;
use tracing::debug;

use super::{Request, Response};

// == Transport Trait ==
/// Sends a request over the network.
///
/// Implementations own connection handling, retries and timeouts. Any error
/// they return reaches the caller unchanged.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> anyhow::Result<Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: Request) -> anyhow::Result<Response> {
        (**self).send(request).await
    }
}

// == Status Error ==
/// A response arrived but its status is not 2xx.
#[derive(Debug, Error)]
#[error("server responded with {status}")]
pub struct StatusError {
    pub status: StatusCode,
    pub response: Response,
}

// == Reqwest Transport ==
/// Transport over a `reqwest::Client`, resolving targets against a base URL.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Creates a transport with a default client.
    ///
    /// # Errors
    /// Fails if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid base URL '{}'", base_url))?;
        Ok(Self::with_client(reqwest::Client::new(), base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> anyhow::Result<Response> {
        let url = self
            .base_url
            .join(request.target())
            .with_context(|| format!("cannot resolve target '{}'", request.target()))?;

        debug!("Sending {} {}", request.method(), url);

        let mut builder = self
            .client
            .request(request.method().clone(), url)
            .headers(request.headers().clone());

        let pairs = request.query_pairs();
        if !pairs.is_empty() {
            builder = builder.query(&pairs);
        }
        if let Some(body) = request.body_bytes() {
            builder = builder.body(body.clone());
        }

        let reply = builder
            .send()
            .await
            .with_context(|| format!("{} {} failed", request.method(), request.target()))?;

        let status = reply.status();
        let headers = reply.headers().clone();
        let body = reply
            .bytes()
            .await
            .with_context(|| format!("reading body of {} failed", request.target()))?;
        let response = Response::new(status, headers, body);

        if !status.is_success() {
            return Err(StatusError { status, response }.into());
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_relative_base() {
        assert!(ReqwestTransport::new("not a url").is_err());
    }

    #[test]
    fn test_base_url_kept() {
        let transport = ReqwestTransport::new("http://127.0.0.1:8080").unwrap();
        assert_eq!(transport.base_url().as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn test_status_error_message() {
        let err = StatusError {
            status: StatusCode::BAD_GATEWAY,
            response: Response::new(StatusCode::BAD_GATEWAY, Default::default(), ""),
        };
        assert_eq!(err.to_string(), "server responded with 502 Bad Gateway");
    }
}
