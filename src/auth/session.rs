//! Session lifecycle events.

use serde::Serialize;

/// Broadcast whenever the held credential changes.
///
/// A UI subscribes to redirect to its login view on [`SessionEvent::Expired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    /// Credentials stored after a successful login.
    LoggedIn,
    /// Access token replaced by a refresh.
    Refreshed,
    /// Refresh failed or the refreshed token was rejected; credentials cleared.
    Expired,
    /// Credentials cleared by an explicit logout.
    LoggedOut,
}
