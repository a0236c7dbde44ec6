//! Request pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! RequestDescriptor (descriptor.rs)
//!     → client.rs (attach bearer + x-request-id, send under deadline)
//!     → 401? auth::refresh (single-flight) → client.rs (one retry, is_retry = true)
//!     → error::ErrorKind (classify status / transport failure)
//!     → notify (one notification per failed logical request)
//!     → ApiResponse | ApiError (types.rs)
//! ```

pub mod client;
pub mod descriptor;
pub mod types;

pub use client::RequestPipeline;
pub use descriptor::RequestDescriptor;
pub use types::{ApiError, ApiResponse, ApiResult};
