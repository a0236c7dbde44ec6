//! Authenticated request pipeline.
//!
//! # Responsibilities
//! - Attach the bearer token and a request ID to every call
//! - Absorb one 401 per logical request via refresh-and-retry
//! - Classify failures into the error taxonomy
//! - Raise exactly one notification per failed logical request
//!
//! # Design Decisions
//! - The retried call reuses the descriptor (now flagged) and the request ID
//! - A 401 on the retried call ends the session instead of refreshing again
//! - Notification happens once, at the outer `send`, never inside attempts

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::broadcast;
use url::Url;
use uuid::Uuid;

use crate::auth::{Credential, CredentialStore, RefreshCoordinator, SessionEvent};
use crate::config::ApiConfig;
use crate::error::ErrorKind;
use crate::notify::{NotificationKind, Notifier};
use crate::observability::metrics;
use crate::pipeline::descriptor::RequestDescriptor;
use crate::pipeline::types::{server_message, ApiError, ApiResponse, ApiResult};
use crate::resilience::timeouts::{with_deadline, Deadline};

/// Status and body of a single attempt, before classification.
#[derive(Debug)]
struct RawResponse {
    status: u16,
    body: Value,
}

/// Single choke point for authenticated calls to the CRM backend.
pub struct RequestPipeline {
    http: reqwest::Client,
    config: ApiConfig,
    timeout: Duration,
    credentials: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
    refresher: RefreshCoordinator,
    events: broadcast::Sender<SessionEvent>,
}

impl RequestPipeline {
    /// Create a pipeline for the configured backend.
    pub fn new(
        config: &ApiConfig,
        credentials: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
    ) -> ApiResult<Self> {
        let refresh_url = endpoint(config, &config.refresh_path)?;
        let http = reqwest::Client::new();
        let (events, _) = broadcast::channel(16);

        let refresher = RefreshCoordinator::new(
            http.clone(),
            refresh_url,
            config.timeout(),
            Arc::clone(&credentials),
            events.clone(),
        );

        Ok(Self {
            http,
            config: config.clone(),
            timeout: config.timeout(),
            credentials,
            notifier,
            refresher,
            events,
        })
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.refresher.set_http_client(client.clone());
        self.http = client;
        self
    }

    /// Backend configuration this pipeline was built from.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Credential store shared with the refresh coordinator.
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Notification sink for failures.
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Store credentials obtained from a login.
    pub fn start_session(&self, credential: Credential) {
        self.credentials.set(credential);
        let _ = self.events.send(SessionEvent::LoggedIn);
    }

    /// Forget credentials after an explicit logout.
    pub fn end_session(&self) {
        self.credentials.clear();
        let _ = self.events.send(SessionEvent::LoggedOut);
    }

    /// Send a request, refreshing credentials and retrying once on 401.
    ///
    /// Every error returned here has already been reported to the notifier.
    pub async fn send(&self, mut descriptor: RequestDescriptor) -> ApiResult<ApiResponse> {
        let start = Instant::now();
        let request_id = Uuid::new_v4();
        let method = descriptor.method().to_string();

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %descriptor.path(),
            "Sending request"
        );

        let result = self.dispatch(&mut descriptor, request_id).await;

        match &result {
            Ok(response) => {
                metrics::record_request(&method, "success", start);
                tracing::debug!(
                    request_id = %request_id,
                    status = response.status,
                    retried = response.retried,
                    "Request completed"
                );
            }
            Err(e) => {
                metrics::record_request(&method, e.kind().as_str(), start);
                tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    path = %descriptor.path(),
                    kind = %e.kind(),
                    error = %e,
                    "Request failed"
                );
                self.report(e);
            }
        }

        result
    }

    /// Raise the single user notification for a failed logical request.
    pub(crate) fn report(&self, error: &ApiError) {
        self.notifier
            .notify(NotificationKind::Failure(error.kind()), &error.user_message());
    }

    async fn dispatch(
        &self,
        descriptor: &mut RequestDescriptor,
        request_id: Uuid,
    ) -> ApiResult<ApiResponse> {
        if descriptor.is_public() {
            let raw = self.execute(descriptor, None, request_id).await?;
            return classify(raw, request_id, false, true);
        }

        let token = self.credentials.access_token();
        let raw = self.execute(descriptor, token.as_deref(), request_id).await?;

        if raw.status != 401 {
            return classify(raw, request_id, false, false);
        }

        tracing::info!(request_id = %request_id, "Access token rejected, refreshing");
        if let Err(e) = self.refresher.refresh(token.as_deref()).await {
            return Err(ApiError::AuthExhausted(e.to_string()));
        }

        descriptor.mark_retry();
        let token = self.credentials.access_token();
        let raw = self.execute(descriptor, token.as_deref(), request_id).await?;

        if raw.status == 401 {
            tracing::warn!(request_id = %request_id, "Refreshed token rejected, ending session");
            self.refresher.expire();
            return Err(ApiError::AuthExhausted(
                "refreshed access token was rejected".to_string(),
            ));
        }

        classify(raw, request_id, true, false)
    }

    async fn execute(
        &self,
        descriptor: &RequestDescriptor,
        token: Option<&str>,
        request_id: Uuid,
    ) -> ApiResult<RawResponse> {
        let url = endpoint(&self.config, descriptor.path())?;

        let mut request = self
            .http
            .request(descriptor.method().clone(), url)
            .header("x-request-id", request_id.to_string());

        if !descriptor.params().is_empty() {
            request = request.query(descriptor.params());
        }
        if let Some(body) = descriptor.body() {
            request = request.json(body);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>(RawResponse {
                status,
                body: parse_body(&bytes),
            })
        };

        match with_deadline(self.timeout, exchange).await {
            Deadline::Completed(raw) => Ok(raw),
            Deadline::Failed(e) => Err(ApiError::Unreachable(e.to_string())),
            Deadline::Elapsed(window) => Err(ApiError::Unreachable(format!(
                "no response within {}ms",
                window.as_millis()
            ))),
        }
    }
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn endpoint(config: &ApiConfig, path: &str) -> ApiResult<Url> {
    config
        .endpoint(path)
        .map_err(|e| ApiError::InvalidRequest(format!("{path}: {e}")))
}

/// Turn a raw attempt into the caller-facing result.
///
/// On public requests a 401 means the submitted credentials were refused.
fn classify(
    raw: RawResponse,
    request_id: Uuid,
    retried: bool,
    public: bool,
) -> ApiResult<ApiResponse> {
    let kind = match ErrorKind::from_status(raw.status) {
        None => {
            return Ok(ApiResponse {
                status: raw.status,
                body: raw.body,
                request_id,
                retried,
            })
        }
        Some(ErrorKind::AuthExpired) if public => ErrorKind::Validation,
        Some(ErrorKind::AuthExpired) => ErrorKind::AuthExhausted,
        Some(kind) => kind,
    };

    let message = server_message(&raw.body).unwrap_or_else(|| kind.user_message().to_string());
    Err(ApiError::Http {
        kind,
        status: raw.status,
        message,
        body: raw.body,
    })
}

/// Parse a response body as JSON, keeping non-JSON text as a string.
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
