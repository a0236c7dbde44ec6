//! Metrics collection.
//!
//! # Metrics
//! - `crm_client_requests_total` (counter): logical requests by method, outcome
//! - `crm_client_request_duration_seconds` (histogram): end-to-end latency incl. refresh+retry
//! - `crm_client_token_refresh_total` (counter): refresh attempts by outcome
//! - `crm_client_submissions_total` (counter): guarded submissions by outcome
//! - `crm_client_lockouts_total` (counter): lockouts imposed by the submission guard
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; installing an exporter is left to the embedding app
//! - Without a recorder every call is a cheap no-op

use std::time::Instant;

/// Record a finished logical request.
pub fn record_request(method: &str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "crm_client_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "crm_client_request_duration_seconds",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a token refresh attempt.
pub fn record_refresh(outcome: &'static str) {
    metrics::counter!("crm_client_token_refresh_total", "outcome" => outcome).increment(1);
}

/// Record a guarded submission.
pub fn record_submission(outcome: &'static str) {
    metrics::counter!("crm_client_submissions_total", "outcome" => outcome).increment(1);
}

/// Record a lockout imposed by the submission guard.
pub fn record_lockout() {
    metrics::counter!("crm_client_lockouts_total").increment(1);
}
