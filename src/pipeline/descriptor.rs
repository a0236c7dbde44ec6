//! Request descriptors.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// An intended HTTP call.
///
/// Immutable once built, apart from the retry flag the pipeline sets
/// (false → true, once) when it reissues the call after a token refresh.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    body: Option<Value>,
    public: bool,
    is_retry: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
            public: false,
            is_retry: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Set the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the JSON body from any serializable value.
    pub fn with_json<T: Serialize>(self, body: &T) -> Result<Self, serde_json::Error> {
        Ok(self.with_body(serde_json::to_value(body)?))
    }

    /// Send without credentials and without refresh-on-401.
    ///
    /// For endpoints that establish a session (login), where a 401 means the
    /// submitted credentials were rejected rather than that a token expired.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn is_retry(&self) -> bool {
        self.is_retry
    }

    pub(crate) fn mark_retry(&mut self) {
        debug_assert!(!self.is_retry, "descriptor retried twice");
        self.is_retry = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let descriptor = RequestDescriptor::post("/leads")
            .with_param("page", 2)
            .with_param("status", "new")
            .with_body(json!({"name": "Nova Records"}));

        assert_eq!(descriptor.method(), &Method::POST);
        assert_eq!(descriptor.path(), "/leads");
        assert_eq!(
            descriptor.params(),
            &[
                ("page".to_string(), "2".to_string()),
                ("status".to_string(), "new".to_string())
            ]
        );
        assert_eq!(descriptor.body().unwrap()["name"], "Nova Records");
        assert!(!descriptor.is_public());
        assert!(!descriptor.is_retry());
    }

    #[test]
    fn test_retry_flag_transitions_once() {
        let mut descriptor = RequestDescriptor::get("/campaigns");
        descriptor.mark_retry();
        assert!(descriptor.is_retry());
    }

    #[test]
    fn test_with_json() {
        #[derive(Serialize)]
        struct Login<'a> {
            email: &'a str,
        }

        let descriptor = RequestDescriptor::post("/auth/login")
            .with_json(&Login { email: "a@b.co" })
            .unwrap()
            .public();

        assert_eq!(descriptor.body().unwrap()["email"], "a@b.co");
        assert!(descriptor.is_public());
    }
}
