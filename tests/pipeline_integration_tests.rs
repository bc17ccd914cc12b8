//! Integration Tests for the Cache Pipeline
//!
//! Drives the pipeline and API client against a real axum backend, both
//! in-process through `tower::ServiceExt::oneshot` and over TCP through
//! `ReqwestTransport`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use http_cache::cache::{KeyPattern, ManualClock};
use http_cache::http::{ReqwestTransport, Request, Response, StatusError, Transport};
use http_cache::{ApiClient, CacheConfig, CacheError, CachePipeline, CachePolicy, SharedCache};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Test Backend ==

/// Counts requests per route so tests can see what reached the server.
#[derive(Clone, Default)]
struct Hits {
    institutions: Arc<AtomicUsize>,
    resources: Arc<AtomicUsize>,
    flaky: Arc<AtomicUsize>,
}

async fn list_institutions(
    State(hits): State<Hits>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let n = hits.institutions.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({ "items": ["Uni A", "Uni B"], "served": n, "query": query }))
}

async fn list_resources(State(hits): State<Hits>) -> Json<Value> {
    let n = hits.resources.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({ "items": [], "served": n }))
}

async fn create_resource(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(json!({ "created": body })))
}

async fn get_resource(Path(id): Path<u32>) -> Result<Json<Value>, StatusCode> {
    if id == 404 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({ "id": id })))
}

/// Fails on the first call, succeeds afterwards.
async fn flaky(State(hits): State<Hits>) -> Result<Json<Value>, StatusCode> {
    match hits.flaky.fetch_add(1, Ordering::SeqCst) {
        0 => Err(StatusCode::SERVICE_UNAVAILABLE),
        n => Ok(Json(json!({ "attempt": n + 1 }))),
    }
}

fn backend(hits: Hits) -> Router {
    Router::new()
        .route("/api/institutions", get(list_institutions))
        .route("/api/resources", get(list_resources).post(create_resource))
        .route("/api/resources/:id", get(get_resource))
        .route("/flaky", get(flaky))
        .with_state(hits)
}

// == Helper Functions ==

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "http_cache=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Serves requests by calling the router directly.
#[derive(Clone)]
struct RouterTransport {
    router: Router,
}

#[async_trait]
impl Transport for RouterTransport {
    async fn send(&self, request: Request) -> anyhow::Result<Response> {
        let mut uri = request.target().to_string();
        let pairs = request.query_pairs();
        if !pairs.is_empty() {
            let query: Vec<String> = pairs
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            uri.push('?');
            uri.push_str(&query.join("&"));
        }

        let mut builder = axum::http::Request::builder()
            .method(request.method().clone())
            .uri(uri);
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }
        let body = request
            .body_bytes()
            .cloned()
            .map(Body::from)
            .unwrap_or_else(Body::empty);

        let reply = self.router.clone().oneshot(builder.body(body)?).await?;
        let status = reply.status();
        let headers = reply.headers().clone();
        let bytes = axum::body::to_bytes(reply.into_body(), usize::MAX).await?;
        let response = Response::new(status, headers, bytes);

        if !status.is_success() {
            return Err(StatusError { status, response }.into());
        }
        Ok(response)
    }
}

fn in_process_pipeline(hits: &Hits) -> CachePipeline<RouterTransport> {
    init_tracing();
    CachePipeline::with_defaults(RouterTransport {
        router: backend(hits.clone()),
    })
}

async fn spawn_server(hits: &Hits) -> String {
    init_tracing();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = backend(hits.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

const NO_PARAMS: [(&str, &str); 0] = [];

// == In-Process Tests ==

#[tokio::test]
async fn test_cached_response_skips_backend() {
    let hits = Hits::default();
    let api = ApiClient::new(in_process_pipeline(&hits));

    let first: Value = api.list_institutions(NO_PARAMS).await.unwrap().json().unwrap();
    let second: Value = api.list_institutions(NO_PARAMS).await.unwrap().json().unwrap();

    assert_eq!(hits.institutions.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert_eq!(second["served"], 1);
}

#[tokio::test]
async fn test_query_params_reach_backend_and_split_entries() {
    let hits = Hits::default();
    let api = ApiClient::new(in_process_pipeline(&hits));

    let a: Value = api
        .list_institutions([("country", "FR"), ("page", "1")])
        .await
        .unwrap()
        .json()
        .unwrap();
    api.list_institutions([("page", "1"), ("country", "FR")])
        .await
        .unwrap();
    api.list_institutions([("page", "2"), ("country", "FR")])
        .await
        .unwrap();

    assert_eq!(a["query"]["country"], "FR");
    assert_eq!(hits.institutions.load(Ordering::SeqCst), 2);
    assert_eq!(api.pipeline().cache().len().await, 2);
}

#[tokio::test]
async fn test_error_status_is_not_cached() {
    let hits = Hits::default();
    let api = ApiClient::new(in_process_pipeline(&hits));

    for _ in 0..2 {
        let err = api.get_resource(404).await.unwrap_err();
        let status = match &err {
            CacheError::Transport(inner) => inner.downcast_ref::<StatusError>().unwrap().status,
            other => panic!("unexpected error: {}", other),
        };
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    assert!(api.pipeline().cache().is_empty().await);
    assert_eq!(api.get_resource(5).await.unwrap().json::<Value>().unwrap()["id"], 5);
}

#[tokio::test]
async fn test_failed_miss_is_retried_by_next_dispatch() {
    let hits = Hits::default();
    let pipeline = in_process_pipeline(&hits);

    let first = pipeline
        .dispatch(Request::get("/flaky"), CachePolicy::cached())
        .await;
    assert!(matches!(first, Err(CacheError::Transport(_))));

    let second = pipeline
        .dispatch(Request::get("/flaky"), CachePolicy::cached())
        .await
        .unwrap();
    let third = pipeline
        .dispatch(Request::get("/flaky"), CachePolicy::cached())
        .await
        .unwrap();

    assert_eq!(hits.flaky.load(Ordering::SeqCst), 2);
    assert_eq!(second, third);
    assert_eq!(third.json::<Value>().unwrap()["attempt"], 2);
}

#[tokio::test]
async fn test_expiry_with_manual_clock() {
    init_tracing();
    let hits = Hits::default();
    let clock = ManualClock::new(0);
    let pipeline = CachePipeline::new(
        RouterTransport {
            router: backend(hits.clone()),
        },
        SharedCache::with_clock(Arc::new(clock.clone())),
        CacheConfig::default(),
    );
    let api = ApiClient::new(pipeline);

    api.list_institutions(NO_PARAMS).await.unwrap();
    clock.advance(Duration::from_secs(601));
    let refreshed: Value = api.list_institutions(NO_PARAMS).await.unwrap().json().unwrap();

    assert_eq!(refreshed["served"], 2);
    assert_eq!(api.pipeline().stats().await.expirations, 1);
}

// == Over-the-Wire Tests ==

#[tokio::test]
async fn test_reqwest_transport_end_to_end() {
    let hits = Hits::default();
    let base = spawn_server(&hits).await;
    let transport = ReqwestTransport::new(&base).unwrap();
    let api = ApiClient::new(CachePipeline::with_defaults(transport));

    let first: Value = api
        .list_institutions([("q", "a b&c")])
        .await
        .unwrap()
        .json()
        .unwrap();
    api.list_institutions([("q", "a b&c")]).await.unwrap();

    assert_eq!(first["query"]["q"], "a b&c");
    assert_eq!(hits.institutions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_reqwest_invalidate_after_mutation() {
    let hits = Hits::default();
    let base = spawn_server(&hits).await;
    let api = ApiClient::new(CachePipeline::with_defaults(
        ReqwestTransport::new(&base).unwrap(),
    ));

    api.list_resources(NO_PARAMS).await.unwrap();
    let created = api
        .create_resource(&json!({ "name": "guide" }))
        .await
        .unwrap();
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json::<Value>().unwrap()["created"]["name"], "guide");

    let pattern = KeyPattern::target_prefix("/api/resources").unwrap();
    assert_eq!(api.invalidate(Some(&pattern)).await, 1);

    let fresh: Value = api.list_resources(NO_PARAMS).await.unwrap().json().unwrap();
    assert_eq!(fresh["served"], 2);
}

#[tokio::test]
async fn test_reqwest_connection_failure_passes_through() {
    init_tracing();
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let pipeline =
        CachePipeline::with_defaults(ReqwestTransport::new(&format!("http://{}", addr)).unwrap());

    let err = pipeline
        .dispatch(Request::get("/api/institutions"), CachePolicy::cached())
        .await
        .unwrap_err();

    let inner = err.as_transport().expect("should be a transport failure");
    assert!(inner.downcast_ref::<reqwest::Error>().is_some());
    assert!(pipeline.cache().is_empty().await);
}
