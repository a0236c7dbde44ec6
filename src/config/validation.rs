//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, lockout bounds ordered)
//! - Check the base URL is an absolute http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::ClientConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "api.timeout_ms").
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Longest lockout window a config may request.
pub const MAX_LOCKOUT_CEILING_SECS: u64 = 86_400;

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.api.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "api.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("api.base_url", e.to_string())),
    }

    if config.api.timeout_ms == 0 {
        errors.push(ValidationError::new("api.timeout_ms", "must be greater than 0"));
    }

    for (field, path) in [
        ("api.refresh_path", &config.api.refresh_path),
        ("api.login_path", &config.api.login_path),
        ("api.logout_path", &config.api.logout_path),
    ] {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(field, "must start with '/'"));
        }
    }

    if config.guard.lockout_threshold == 0 {
        errors.push(ValidationError::new(
            "guard.lockout_threshold",
            "must be greater than 0",
        ));
    }

    if config.guard.base_lockout_secs == 0 {
        errors.push(ValidationError::new(
            "guard.base_lockout_secs",
            "must be greater than 0",
        ));
    }

    if config.guard.max_lockout_secs > MAX_LOCKOUT_CEILING_SECS {
        errors.push(ValidationError::new(
            "guard.max_lockout_secs",
            format!("must be at most {MAX_LOCKOUT_CEILING_SECS} (one day)"),
        ));
    }

    if config.guard.max_lockout_secs < config.guard.base_lockout_secs {
        errors.push(ValidationError::new(
            "guard.max_lockout_secs",
            format!(
                "must be at least base_lockout_secs ({})",
                config.guard.base_lockout_secs
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
