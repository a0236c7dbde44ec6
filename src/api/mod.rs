//! CRM domain API built on the request pipeline.
//!
//! # Responsibilities
//! - Build descriptors for the backend's auth and resource endpoints
//! - Tie login/logout to the credential store
//!
//! Every call goes through [`RequestPipeline::send`], so refresh, retry
//! and failure notification apply uniformly.

pub mod auth;
pub mod resources;

use std::sync::Arc;

use crate::pipeline::RequestPipeline;

pub use auth::{login_form_schema, AuthApi, LoginResponse};
pub use resources::ResourceApi;

/// Entry point to the CRM endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    pipeline: Arc<RequestPipeline>,
}

impl ApiClient {
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Arc<RequestPipeline> {
        &self.pipeline
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(Arc::clone(&self.pipeline))
    }

    pub fn leads(&self) -> ResourceApi {
        ResourceApi::new(Arc::clone(&self.pipeline), "/leads")
    }

    pub fn campaigns(&self) -> ResourceApi {
        ResourceApi::new(Arc::clone(&self.pipeline), "/campaigns")
    }

    pub fn analytics(&self) -> ResourceApi {
        ResourceApi::new(Arc::clone(&self.pipeline), "/analytics")
    }

    pub fn users(&self) -> ResourceApi {
        ResourceApi::new(Arc::clone(&self.pipeline), "/users")
    }
}
