//! Credential storage.
//!
//! # Responsibilities
//! - Hold the current access/refresh token pair
//! - Replace it atomically on login and refresh
//! - Clear it on logout or refresh failure
//!
//! # Design Decisions
//! - Storage is a trait so the composition root decides where tokens live
//! - The in-memory store swaps an `Arc<Credential>` lock-free; readers never block a refresh
//! - Tokens are redacted from `Debug` output

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};

/// An access/refresh token pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Short-lived bearer token attached to every request.
    pub access_token: String,
    /// Long-lived token exchanged for a new access token.
    pub refresh_token: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    format!("{prefix}…")
}

/// Where the pipeline reads and writes credentials.
pub trait CredentialStore: Send + Sync {
    /// Current credential, if logged in.
    fn get(&self) -> Option<Credential>;

    /// Replace the current credential.
    fn set(&self, credential: Credential);

    /// Forget the current credential.
    fn clear(&self);

    /// Current access token, if any.
    fn access_token(&self) -> Option<String> {
        self.get().map(|c| c.access_token)
    }
}

/// Process-local credential store.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    current: ArcSwapOption<Credential>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a credential (e.g., restored from a cookie jar).
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            current: ArcSwapOption::from_pointee(credential),
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.current.load_full().map(|c| (*c).clone())
    }

    fn set(&self, credential: Credential) {
        self.current.store(Some(Arc::new(credential)));
    }

    fn clear(&self) {
        self.current.store(None);
    }
}

impl fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryCredentialStore")
            .field("logged_in", &self.current.load().is_some())
            .finish()
    }
}
