//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (deadline over send + body read; expiry ⇒ unreachable)
//!
//! Failed guarded submission:
//!     → backoff.rs (lockout duration from the consecutive failure count)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Backoff is a pure function so the lockout policy is testable without clocks

pub mod backoff;
pub mod timeouts;
