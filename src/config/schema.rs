//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Root configuration for the CRM client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend API settings (base URL, timeouts, auth endpoints).
    pub api: ApiConfig,

    /// Submission guard lockout policy.
    pub guard: GuardConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Backend API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every descriptor path is joined onto (e.g., "http://localhost:5000/api").
    pub base_url: String,

    /// Request timeout in milliseconds, covering send and body read.
    pub timeout_ms: u64,

    /// Path of the token refresh endpoint.
    pub refresh_path: String,

    /// Path of the login endpoint.
    pub login_path: String,

    /// Path of the logout endpoint.
    pub logout_path: String,
}

impl ApiConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Absolute URL for an API path, appended to the base URL's own path.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_ms: 30_000,
            refresh_path: "/auth/refresh".to_string(),
            login_path: "/auth/login".to_string(),
            logout_path: "/auth/logout".to_string(),
        }
    }
}

/// Lockout policy for the submission guard.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Failed submissions before the first lockout.
    pub lockout_threshold: u32,

    /// Lockout duration at the threshold, in seconds. Doubles per further failure.
    pub base_lockout_secs: u64,

    /// Upper bound for any single lockout, in seconds.
    pub max_lockout_secs: u64,

    /// Clear field state after a successful submission.
    pub reset_fields_on_success: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            lockout_threshold: 5,
            base_lockout_secs: 30,
            max_lockout_secs: 300,
            reset_fields_on_success: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
