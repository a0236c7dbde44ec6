//! Failure taxonomy shared by the request pipeline and the submission guard.

use std::fmt;

use serde::Serialize;

/// Every failure the client can surface, classified once.
///
/// `Validation` and `LockedOut` are raised before the network is touched;
/// `AuthExpired` is absorbed by the pipeline's refresh-and-retry and only
/// `AuthExhausted` reaches callers when that recovery fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    AuthExpired,
    AuthExhausted,
    Forbidden,
    NotFound,
    Conflict,
    RateLimited,
    ServerError,
    Unreachable,
    LockedOut,
}

impl ErrorKind {
    /// Classify an HTTP status. Returns `None` for non-error statuses.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            100..=399 => None,
            401 => Some(Self::AuthExpired),
            403 => Some(Self::Forbidden),
            404 => Some(Self::NotFound),
            409 => Some(Self::Conflict),
            429 => Some(Self::RateLimited),
            500..=599 => Some(Self::ServerError),
            // 400, 422 and any other client error: the request itself was refused.
            _ => Some(Self::Validation),
        }
    }

    /// Default user-facing text for this kind.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::Validation => "The request was rejected. Please check the submitted data.",
            Self::AuthExpired => "Your session has expired. Reconnecting...",
            Self::AuthExhausted => "Your session has expired. Please log in again.",
            Self::Forbidden => "You do not have permission to perform this action.",
            Self::NotFound => "The requested resource was not found.",
            Self::Conflict => "This resource already exists or was modified concurrently.",
            Self::RateLimited => "Too many requests. Please wait a moment and try again.",
            Self::ServerError => "The server encountered an error. Please try again later.",
            Self::Unreachable => {
                "Unable to reach the server. Check your connection and try again."
            }
            Self::LockedOut => "Too many failed attempts. Please wait before trying again.",
        }
    }

    /// Stable label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::AuthExpired => "auth_expired",
            Self::AuthExhausted => "auth_exhausted",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::Unreachable => "unreachable",
            Self::LockedOut => "locked_out",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
