//! User notification side-channel.
//!
//! # Responsibilities
//! - Define the `Notifier` capability the pipeline and guard report through
//! - Provide a tracing-backed notifier for headless use
//! - Provide a buffering notifier a UI (or a test) can drain
//!
//! # Design Decisions
//! - Injected, never global: each pipeline/guard owns an `Arc<dyn Notifier>`
//! - One call per failure event; callers never batch or repeat
//! - `notify` is synchronous; implementations must not block

use std::sync::Mutex;

use serde::Serialize;

use crate::error::ErrorKind;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "kind")]
pub enum NotificationKind {
    Success,
    Info,
    Failure(ErrorKind),
}

/// A single user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// Sink for user-facing notifications (toasts, status lines, logs).
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str);
}

/// Writes notifications to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Success => tracing::info!(%message, "success"),
            NotificationKind::Info => tracing::info!(%message, "notice"),
            NotificationKind::Failure(error) => {
                tracing::warn!(kind = %error, %message, "failure")
            }
        }
    }
}

/// Collects notifications in memory until drained.
#[derive(Debug, Default)]
pub struct BufferedNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl BufferedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything collected so far.
    pub fn drain(&self) -> Vec<Notification> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *entries)
    }

    /// Copy of everything collected so far.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of failure notifications of the given kind.
    pub fn count_failures(&self, kind: ErrorKind) -> usize {
        self.snapshot()
            .iter()
            .filter(|n| n.kind == NotificationKind::Failure(kind))
            .count()
    }
}

impl Notifier for BufferedNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Notification {
                kind,
                message: message.to_string(),
            });
    }
}
