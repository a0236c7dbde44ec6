//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap every outbound exchange (request + body read) in a deadline
//! - Report expiry as its own outcome, distinct from transport errors
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - The deadline covers the whole exchange, not only the connect phase
//! - Dropping the timed-out future cancels the underlying request

use std::future::Future;
use std::time::Duration;

/// Outcome of a deadline-bound exchange.
#[derive(Debug)]
pub enum Deadline<T, E> {
    /// Completed in time, successfully.
    Completed(T),
    /// Completed in time with a transport error.
    Failed(E),
    /// Did not complete within the window.
    Elapsed(Duration),
}

/// Run `exchange` with a deadline of `window`.
pub async fn with_deadline<F, T, E>(window: Duration, exchange: F) -> Deadline<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(window, exchange).await {
        Ok(Ok(value)) => Deadline::Completed(value),
        Ok(Err(e)) => Deadline::Failed(e),
        Err(_) => Deadline::Elapsed(window),
    }
}
