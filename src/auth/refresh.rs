//! Single-flight token refresh.
//!
//! # Responsibilities
//! - Exchange the held refresh token for a new access token
//! - Coalesce concurrent refresh demands into one call to the auth server
//! - Clear credentials and announce expiry when the exchange fails
//!
//! # Design Decisions
//! - Refreshes are serialized behind one async mutex
//! - A waiter that finds the access token already replaced reuses that result
//! - Any refresh failure is terminal for the session (no retry of the refresh itself)

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use url::Url;

use crate::auth::credentials::{Credential, CredentialStore};
use crate::auth::session::SessionEvent;
use crate::observability::metrics;
use crate::resilience::timeouts::{with_deadline, Deadline};

/// Why a refresh could not produce a new access token.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("no refresh token held")]
    NoCredentials,

    #[error("refresh rejected with status {0}")]
    Rejected(u16),

    #[error("refresh transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("refresh timed out after {0:?}")]
    Timeout(Duration),
}

/// How a successful refresh demand was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// This caller performed the exchange.
    Refreshed,
    /// A concurrent caller already replaced the stale token.
    Coalesced,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    token: String,
    #[serde(rename = "refreshToken", default)]
    refresh_token: Option<String>,
}

/// Performs and coalesces token refreshes against the auth server.
pub struct RefreshCoordinator {
    http: reqwest::Client,
    refresh_url: Url,
    timeout: Duration,
    credentials: Arc<dyn CredentialStore>,
    events: broadcast::Sender<SessionEvent>,
    in_flight: Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new(
        http: reqwest::Client,
        refresh_url: Url,
        timeout: Duration,
        credentials: Arc<dyn CredentialStore>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            http,
            refresh_url,
            timeout,
            credentials,
            events,
            in_flight: Mutex::new(()),
        }
    }

    pub(crate) fn set_http_client(&mut self, http: reqwest::Client) {
        self.http = http;
    }

    /// Obtain a fresh access token to replace `stale_access_token`.
    ///
    /// Concurrent callers presenting the same stale token trigger a single
    /// exchange; the others return [`RefreshOutcome::Coalesced`] once it lands.
    /// On failure the credential store is cleared and [`SessionEvent::Expired`]
    /// is broadcast exactly once.
    pub async fn refresh(
        &self,
        stale_access_token: Option<&str>,
    ) -> Result<RefreshOutcome, RefreshError> {
        let _in_flight = self.in_flight.lock().await;

        let current = self
            .credentials
            .get()
            .ok_or(RefreshError::NoCredentials)?;

        if stale_access_token != Some(current.access_token.as_str()) {
            tracing::debug!("Access token already refreshed by a concurrent request");
            metrics::record_refresh("coalesced");
            return Ok(RefreshOutcome::Coalesced);
        }

        match self.exchange(&current.refresh_token).await {
            Ok(response) => {
                let refresh_token = response.refresh_token.unwrap_or(current.refresh_token);
                self.credentials
                    .set(Credential::new(response.token, refresh_token));
                metrics::record_refresh("success");
                tracing::info!("Access token refreshed");
                let _ = self.events.send(SessionEvent::Refreshed);
                Ok(RefreshOutcome::Refreshed)
            }
            Err(e) => {
                metrics::record_refresh("failure");
                tracing::warn!(error = %e, "Token refresh failed, clearing session");
                self.expire();
                Err(e)
            }
        }
    }

    /// Drop the session: clear credentials and announce expiry.
    pub fn expire(&self) {
        self.credentials.clear();
        let _ = self.events.send(SessionEvent::Expired);
    }

    async fn exchange(&self, refresh_token: &str) -> Result<RefreshResponse, RefreshError> {
        let exchange = async {
            let response = self
                .http
                .post(self.refresh_url.clone())
                .json(&RefreshRequest { refresh_token })
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(RefreshError::Rejected(response.status().as_u16()));
            }

            Ok(response.json::<RefreshResponse>().await?)
        };

        match with_deadline(self.timeout, exchange).await {
            Deadline::Completed(response) => Ok(response),
            Deadline::Failed(e) => Err(e),
            Deadline::Elapsed(window) => Err(RefreshError::Timeout(window)),
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_url", &self.refresh_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::InMemoryCredentialStore;

    fn coordinator(
        store: Arc<dyn CredentialStore>,
    ) -> (RefreshCoordinator, broadcast::Receiver<SessionEvent>) {
        let (tx, rx) = broadcast::channel(8);
        let coordinator = RefreshCoordinator::new(
            reqwest::Client::new(),
            // Nothing listens here; an exchange would fail with a transport error.
            "http://127.0.0.1:9/auth/refresh".parse().unwrap(),
            Duration::from_secs(1),
            store,
            tx,
        );
        (coordinator, rx)
    }

    #[tokio::test]
    async fn test_no_credentials() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let (coordinator, _rx) = coordinator(store);

        let err = coordinator.refresh(Some("stale")).await.unwrap_err();
        assert!(matches!(err, RefreshError::NoCredentials));
    }

    #[tokio::test]
    async fn test_already_replaced_token_is_coalesced() {
        let store = Arc::new(InMemoryCredentialStore::with_credential(Credential::new(
            "fresh", "refresh",
        )));
        let (coordinator, _rx) = coordinator(store.clone());

        let outcome = coordinator.refresh(Some("stale")).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Coalesced);
        assert_eq!(store.access_token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_failed_exchange_clears_and_announces() {
        let store = Arc::new(InMemoryCredentialStore::with_credential(Credential::new(
            "stale", "refresh",
        )));
        let (coordinator, mut rx) = coordinator(store.clone());

        assert!(coordinator.refresh(Some("stale")).await.is_err());
        assert!(store.get().is_none());
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Expired);
        assert!(rx.try_recv().is_err());
    }
}
