//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;

use crm_client::auth::{Credential, CredentialStore, InMemoryCredentialStore};
use crm_client::config::ApiConfig;
use crm_client::notify::BufferedNotifier;
use crm_client::pipeline::RequestPipeline;

/// What the mock backend saw for one request.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
    pub body: Value,
}

/// A running mock backend.
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockBackend {
    /// Base URL with the backend's `/api` prefix.
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received for `path` (including the `/api` prefix).
    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

/// Start a programmable mock backend on an ephemeral port.
///
/// `handler` decides the status and JSON body for each recorded request.
pub async fn start_backend<F, Fut>(handler: F) -> MockBackend
where
    F: Fn(Recorded) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, Value)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let log = requests.clone();
    let app = Router::new().fallback(move |request: Request| {
        let handler = handler.clone();
        let log = log.clone();
        async move { respond(request, handler, log).await }
    });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend { addr, requests }
}

async fn respond<F, Fut>(
    request: Request,
    handler: Arc<F>,
    log: Arc<Mutex<Vec<Recorded>>>,
) -> Response
where
    F: Fn(Recorded) -> Fut,
    Fut: Future<Output = (u16, Value)>,
{
    let (parts, body) = request.into_parts();
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();

    let recorded = Recorded {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        authorization: header("authorization"),
        request_id: header("x-request-id"),
        body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
    };
    log.lock().unwrap().push(recorded.clone());

    let (status, body) = handler(recorded).await;
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}

/// API config pointed at `base_url` with a short timeout.
pub fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        timeout_ms: 2_000,
        ..ApiConfig::default()
    }
}

/// Pipeline wired to a buffered notifier and an in-memory store.
pub fn pipeline(
    config: &ApiConfig,
    credential: Option<Credential>,
) -> (Arc<RequestPipeline>, Arc<BufferedNotifier>, Arc<InMemoryCredentialStore>) {
    let store = Arc::new(match credential {
        Some(credential) => InMemoryCredentialStore::with_credential(credential),
        None => InMemoryCredentialStore::new(),
    });
    let notifier = Arc::new(BufferedNotifier::new());
    let pipeline = RequestPipeline::new(config, store.clone(), notifier.clone()).unwrap();
    (Arc::new(pipeline), notifier, store)
}

/// The access token currently held, if any.
pub fn held_token(store: &InMemoryCredentialStore) -> Option<String> {
    store.access_token()
}
