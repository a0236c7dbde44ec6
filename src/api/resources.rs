//! Generic CRUD over one backend collection.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::pipeline::{ApiError, ApiResult, RequestDescriptor, RequestPipeline};

/// CRUD calls for a collection such as `/leads`.
#[derive(Debug, Clone)]
pub struct ResourceApi {
    pipeline: Arc<RequestPipeline>,
    base: String,
}

impl ResourceApi {
    pub fn new(pipeline: Arc<RequestPipeline>, base: impl Into<String>) -> Self {
        Self {
            pipeline,
            base: base.into(),
        }
    }

    /// Collection path, e.g. `/leads`.
    pub fn base(&self) -> &str {
        &self.base
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.base, id)
    }

    /// `GET /base?params`.
    pub async fn list(&self, params: &[(&str, &str)]) -> ApiResult<Value> {
        let descriptor = params
            .iter()
            .fold(RequestDescriptor::get(&self.base), |d, (key, value)| {
                d.with_param(*key, value)
            });
        Ok(self.pipeline.send(descriptor).await?.body)
    }

    /// `GET /base/{id}`.
    pub async fn get(&self, id: &str) -> ApiResult<Value> {
        let descriptor = RequestDescriptor::get(self.item_path(id));
        Ok(self.pipeline.send(descriptor).await?.body)
    }

    /// `POST /base` with `body`.
    pub async fn create<T: Serialize>(&self, body: &T) -> ApiResult<Value> {
        let descriptor = self.with_json(RequestDescriptor::post(&self.base), body)?;
        Ok(self.pipeline.send(descriptor).await?.body)
    }

    /// `PUT /base/{id}` with `body`.
    pub async fn update<T: Serialize>(&self, id: &str, body: &T) -> ApiResult<Value> {
        let descriptor = self.with_json(RequestDescriptor::put(self.item_path(id)), body)?;
        Ok(self.pipeline.send(descriptor).await?.body)
    }

    /// `DELETE /base/{id}`.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let descriptor = RequestDescriptor::delete(self.item_path(id));
        self.pipeline.send(descriptor).await?;
        Ok(())
    }

    fn with_json<T: Serialize>(
        &self,
        descriptor: RequestDescriptor,
        body: &T,
    ) -> ApiResult<RequestDescriptor> {
        descriptor.with_json(body).map_err(|e| {
            let error = ApiError::InvalidRequest(e.to_string());
            self.pipeline.report(&error);
            error
        })
    }
}
