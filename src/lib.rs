//! Authenticated request pipeline and form submission guard for the CRM backend.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod notify;
pub mod observability;
pub mod pipeline;
pub mod resilience;

pub use api::ApiClient;
pub use config::schema::ClientConfig;
pub use error::ErrorKind;
pub use guard::SubmissionGuard;
pub use pipeline::RequestPipeline;
