//! Login and logout.
//!
//! # Design Decisions
//! - Login is a public request: a 401 there means bad credentials, not an
//!   expired session, and must not trigger a refresh
//! - Logout clears local credentials even when the backend call fails

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::Credential;
use crate::guard::{FieldRules, FormSchema, FormValues, SubmitOutcome};
use crate::pipeline::{ApiError, ApiResult, RequestDescriptor, RequestPipeline};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Validation rules of the login form.
pub fn login_form_schema() -> FormSchema {
    FormSchema::new()
        .field(
            "email",
            FieldRules::new()
                .required("Email is required")
                .pattern(EMAIL_PATTERN.clone(), "Enter a valid email address"),
        )
        .field("password", FieldRules::new().required("Password is required"))
}

/// Body returned by a successful login.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub user: Option<Value>,
}

/// Session endpoints.
#[derive(Debug, Clone)]
pub struct AuthApi {
    pipeline: Arc<RequestPipeline>,
}

impl AuthApi {
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self { pipeline }
    }

    /// Exchange email and password for a session; stores the credentials.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let descriptor = RequestDescriptor::post(&self.pipeline.config().login_path)
            .with_body(json!({ "email": email, "password": password }))
            .public();

        let response = self.pipeline.send(descriptor).await?;
        let login: LoginResponse = response.json().inspect_err(|e| self.pipeline.report(e))?;

        self.pipeline
            .start_session(Credential::new(&login.token, &login.refresh_token));
        tracing::info!(request_id = %response.request_id, "Logged in");
        Ok(login)
    }

    /// Login from a guarded form payload, for use as a submit function.
    ///
    /// A refused login is `Err`, already notified by the pipeline.
    pub async fn submit_login(&self, values: FormValues) -> Result<SubmitOutcome, ApiError> {
        let field = |name: &str| {
            values
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        self.login(&field("email"), &field("password")).await?;
        Ok(SubmitOutcome::ok())
    }

    /// End the session on the backend and locally.
    pub async fn logout(&self) -> ApiResult<()> {
        let descriptor = RequestDescriptor::post(&self.pipeline.config().logout_path);
        let result = self.pipeline.send(descriptor).await;
        self.pipeline.end_session();
        tracing::info!("Logged out");
        result.map(|_| ())
    }

    /// The signed-in user's profile.
    pub async fn me(&self) -> ApiResult<Value> {
        Ok(self.pipeline.send(RequestDescriptor::get("/auth/me")).await?.body)
    }
}
