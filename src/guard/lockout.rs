//! Brute-force lockout state.
//!
//! # Responsibilities
//! - Count consecutive failed submissions
//! - Impose an exponentially growing rejection window past the threshold
//! - Reset on success
//!
//! # Design Decisions
//! - Expiry is evaluated lazily against the wall clock; no timers
//! - The failure count survives an expired window, so the next failure escalates
//! - `blocked_until` is only ever set while `attempt_count >= threshold`

use std::time::{Duration, SystemTime};

use crate::config::GuardConfig;
use crate::resilience::backoff::{calculate_backoff, BASE_LOCKOUT, LOCKOUT_THRESHOLD, MAX_LOCKOUT};

/// When and how long to lock a form out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub threshold: u32,
    pub base: Duration,
    pub max: Duration,
}

impl LockoutPolicy {
    /// Lockout imposed after `attempt_count` consecutive failures, if any.
    pub fn duration_for(&self, attempt_count: u32) -> Option<Duration> {
        (attempt_count >= self.threshold)
            .then(|| calculate_backoff(attempt_count - self.threshold, self.base, self.max))
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            threshold: LOCKOUT_THRESHOLD,
            base: BASE_LOCKOUT,
            max: MAX_LOCKOUT,
        }
    }
}

impl From<&GuardConfig> for LockoutPolicy {
    fn from(config: &GuardConfig) -> Self {
        Self {
            threshold: config.lockout_threshold,
            base: Duration::from_secs(config.base_lockout_secs),
            max: Duration::from_secs(config.max_lockout_secs),
        }
    }
}

/// Failure count and current rejection window of one form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockoutState {
    pub attempt_count: u32,
    pub blocked_until: Option<SystemTime>,
}

impl LockoutState {
    /// Time left in the rejection window, `None` when not locked.
    pub fn remaining(&self, now: SystemTime) -> Option<Duration> {
        self.blocked_until
            .and_then(|until| until.duration_since(now).ok())
            .filter(|left| !left.is_zero())
    }

    /// Record a failed submission. Returns the lockout imposed, if any.
    ///
    /// A window that would overflow the clock falls back to [`MAX_LOCKOUT`].
    pub fn record_failure(&mut self, now: SystemTime, policy: &LockoutPolicy) -> Option<Duration> {
        self.attempt_count = self.attempt_count.saturating_add(1);
        let lockout = policy
            .duration_for(self.attempt_count)
            .map(|d| if now.checked_add(d).is_some() { d } else { MAX_LOCKOUT });
        self.blocked_until = lockout.and_then(|d| now.checked_add(d));
        lockout
    }

    /// Record a successful submission.
    pub fn record_success(&mut self) {
        *self = Self::default();
    }
}
