//! Pipeline response and error types.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ErrorKind;

/// A successful (2xx/3xx) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body; `Null` when empty, a JSON string when not JSON.
    pub body: Value,
    /// Identifier sent as `x-request-id`, shared by the original and the retried call.
    pub request_id: Uuid,
    /// Whether this response came from the post-refresh retry.
    pub retried: bool,
}

impl ApiResponse {
    /// Deserialize the body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        T::deserialize(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Errors surfaced by the request pipeline.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Backend answered with a classified error status.
    #[error("HTTP {status} ({kind}): {message}")]
    Http {
        kind: ErrorKind,
        status: u16,
        message: String,
        body: Value,
    },

    /// Token refresh failed or the refreshed token was rejected; session cleared.
    #[error("session expired: {0}")]
    AuthExhausted(String),

    /// Transport failure or timeout; no HTTP status was received.
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The descriptor could not be turned into a request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Position of this error in the failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http { kind, .. } => *kind,
            Self::AuthExhausted(_) => ErrorKind::AuthExhausted,
            Self::Unreachable(_) => ErrorKind::Unreachable,
            Self::InvalidRequest(_) => ErrorKind::Validation,
            Self::Decode(_) => ErrorKind::ServerError,
        }
    }

    /// HTTP status, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text shown to the user for this error.
    ///
    /// Backend-provided messages win for HTTP errors; transport and session
    /// failures use the generic text of their kind.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { message, .. } => message.clone(),
            other => other.kind().user_message().to_string(),
        }
    }
}

/// Result type for pipeline operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Pull a human-readable message out of an error body (`{"message": ...}` or `{"error": ...}`).
pub(crate) fn server_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .filter_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_message() {
        assert_eq!(
            server_message(&json!({"message": "Lead not found"})).as_deref(),
            Some("Lead not found")
        );
        assert_eq!(
            server_message(&json!({"error": "Email already used"})).as_deref(),
            Some("Email already used")
        );
        assert_eq!(server_message(&json!({"message": "  "})), None);
        assert_eq!(server_message(&json!("plain text")), None);
        assert_eq!(server_message(&Value::Null), None);
    }

    #[test]
    fn test_user_message_falls_back_to_kind() {
        let err = ApiError::Unreachable("connection refused".into());
        assert_eq!(err.kind(), ErrorKind::Unreachable);
        assert_eq!(err.user_message(), ErrorKind::Unreachable.user_message());

        let err = ApiError::Http {
            kind: ErrorKind::Conflict,
            status: 409,
            message: "Campaign name taken".into(),
            body: Value::Null,
        };
        assert_eq!(err.user_message(), "Campaign name taken");
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn test_response_json() {
        #[derive(serde::Deserialize)]
        struct Lead {
            name: String,
        }

        let response = ApiResponse {
            status: 200,
            body: json!({"name": "Bassline Booking"}),
            request_id: Uuid::new_v4(),
            retried: false,
        };
        assert_eq!(response.json::<Lead>().unwrap().name, "Bassline Booking");
        assert!(matches!(
            response.json::<Vec<Lead>>(),
            Err(ApiError::Decode(_))
        ));
    }
}
