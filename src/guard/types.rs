//! Submission guard types and error definitions.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorKind;

/// Result reported by a submit function.
///
/// Mirrors the `{success, error?}` body the backend returns for form endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmitOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Where a form currently is in its submission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardPhase {
    Idle,
    Validating,
    Submitting,
    Locked,
}

/// Whole seconds, rounded up, for countdown display.
pub fn ceil_secs(duration: &Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// Why a guarded submission did not succeed.
#[derive(Debug, Error)]
pub enum GuardError {
    /// Rejected before anything ran: the form is in a lockout window.
    #[error("locked out for another {}s", ceil_secs(.remaining))]
    LockedOut { remaining: Duration },

    /// Rejected: another submission of this form is still running.
    #[error("a submission is already in progress")]
    InFlight,

    /// Rejected locally; nothing was sent.
    #[error("{} field(s) failed validation", .errors.len())]
    Validation { errors: BTreeMap<String, String> },

    /// The submit function ran and failed.
    #[error("submission failed: {message}")]
    Failed {
        message: String,
        attempt_count: u32,
        /// Lockout imposed by this failure, if it crossed the threshold.
        locked_for: Option<Duration>,
    },

    /// The caller cancelled while the submit function was running.
    #[error("submission cancelled")]
    Cancelled,
}

impl GuardError {
    /// Taxonomy kind for errors that map onto one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::LockedOut { .. } => Some(ErrorKind::LockedOut),
            Self::Validation { .. } => Some(ErrorKind::Validation),
            Self::InFlight | Self::Failed { .. } | Self::Cancelled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_deserializes_backend_shape() {
        let outcome: SubmitOutcome =
            serde_json::from_str(r#"{"success": false, "error": "Wrong password"}"#).unwrap();
        assert_eq!(outcome, SubmitOutcome::failed("Wrong password"));

        let outcome: SubmitOutcome = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(outcome, SubmitOutcome::ok());
    }

    #[test]
    fn test_locked_out_message_rounds_up() {
        let err = GuardError::LockedOut {
            remaining: Duration::from_millis(300),
        };
        assert_eq!(err.to_string(), "locked out for another 1s");

        let err = GuardError::LockedOut {
            remaining: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "locked out for another 30s");
    }
}
