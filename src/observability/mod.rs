//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline / guard / auth produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms via the metrics facade)
//!
//! Consumers:
//!     → stderr log output (CLI) or the embedding app's subscriber
//!     → whatever metrics recorder the embedding app installs
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a logical request
//! - Tokens are never logged

pub mod logging;
pub mod metrics;
