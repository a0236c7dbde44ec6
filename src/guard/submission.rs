//! Guarded form submission.
//!
//! # Responsibilities
//! - Reject submissions during a lockout window, before anything runs
//! - Reject re-entrant submissions of the same form
//! - Validate and sanitize the payload before it leaves the form
//! - Escalate the lockout on failure, reset it on success
//!
//! # State Transitions
//! ```text
//! Idle → Validating → Submitting → Success → Idle
//!                                → Failed  → Idle
//!                                          → Locked (attempt_count >= threshold)
//! Locked → Idle: blocked_until elapsed (checked lazily)
//! ```
//!
//! # Design Decisions
//! - One notification per failure event; errors raised by the request
//!   pipeline were already reported there and are not repeated
//! - Cancellation is not a failure and does not count toward lockout
//! - The in-flight flag and the in-progress phase are released by a drop
//!   guard, so an abandoned submission never wedges the form

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::GuardConfig;
use crate::error::ErrorKind;
use crate::guard::clock::{Clock, SystemClock};
use crate::guard::form::{FieldState, FormState, FormValues};
use crate::guard::lockout::{LockoutPolicy, LockoutState};
use crate::guard::rules::FormSchema;
use crate::guard::sanitize::sanitize_payload;
use crate::guard::types::{ceil_secs, GuardError, GuardPhase, SubmitOutcome};
use crate::notify::{NotificationKind, Notifier};
use crate::observability::metrics;
use crate::pipeline::ApiError;

const DEFAULT_FAILURE_MESSAGE: &str = "Submission failed. Please try again.";

/// Marks a form as submitting for as long as it lives.
///
/// On drop a phase still showing work in progress returns to `Idle`, so a
/// dropped `submit` future leaves neither the flag nor the phase behind.
struct InFlight<'a> {
    flag: &'a AtomicBool,
    phase: &'a Mutex<GuardPhase>,
}

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, phase: &'a Mutex<GuardPhase>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag, phase })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut phase = lock(self.phase);
        if matches!(*phase, GuardPhase::Validating | GuardPhase::Submitting) {
            *phase = GuardPhase::Idle;
        }
        drop(phase);
        self.flag.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Validates, sanitizes and rate-limits submissions of one form instance.
pub struct SubmissionGuard {
    form: Mutex<FormState>,
    lockout: Mutex<LockoutState>,
    phase: Mutex<GuardPhase>,
    submitting: AtomicBool,
    policy: LockoutPolicy,
    reset_fields_on_success: bool,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl SubmissionGuard {
    pub fn new(schema: FormSchema, config: &GuardConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            form: Mutex::new(FormState::new(schema)),
            lockout: Mutex::new(LockoutState::default()),
            phase: Mutex::new(GuardPhase::Idle),
            submitting: AtomicBool::new(false),
            policy: LockoutPolicy::from(config),
            reset_fields_on_success: config.reset_fields_on_success,
            clock: Arc::new(SystemClock),
            notifier,
        }
    }

    /// Use a different clock for lockout expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate one value against the form's rules. Pure.
    pub fn validate_field(&self, name: &str, value: &str) -> Option<String> {
        lock(&self.form).schema().validate_field(name, value)
    }

    /// Update a field value (revalidated if already touched).
    pub fn set_value(&self, name: &str, value: impl Into<String>) {
        lock(&self.form).set_value(name, value);
    }

    /// Mark a field touched and validate it.
    pub fn blur(&self, name: &str) {
        lock(&self.form).blur(name);
    }

    /// Snapshot of one field's state.
    pub fn field(&self, name: &str) -> Option<FieldState> {
        lock(&self.form).field(name).cloned()
    }

    /// Current field errors.
    pub fn errors(&self) -> BTreeMap<String, String> {
        lock(&self.form).errors()
    }

    /// Clear all field state.
    pub fn reset_fields(&self) {
        lock(&self.form).reset();
    }

    /// Snapshot of the lockout counters.
    pub fn lockout_state(&self) -> LockoutState {
        *lock(&self.lockout)
    }

    /// Time left before submissions are accepted again, for countdown display.
    pub fn remaining_lockout(&self) -> Option<Duration> {
        lock(&self.lockout).remaining(self.clock.now())
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> GuardPhase {
        let mut phase = lock(&self.phase);
        if *phase == GuardPhase::Locked && self.remaining_lockout().is_none() {
            *phase = GuardPhase::Idle;
        }
        *phase
    }

    fn set_phase(&self, phase: GuardPhase) {
        *lock(&self.phase) = phase;
    }

    /// Submit `payload` through `submit_fn` under the guard's rules.
    ///
    /// `submit_fn` receives the sanitized payload. It reports a rejected
    /// submission either as `Ok(SubmitOutcome { success: false, .. })` or as
    /// an [`ApiError`] from the request pipeline (already notified there).
    pub async fn submit<F, Fut>(
        &self,
        payload: FormValues,
        submit_fn: F,
    ) -> Result<SubmitOutcome, GuardError>
    where
        F: FnOnce(FormValues) -> Fut,
        Fut: Future<Output = Result<SubmitOutcome, ApiError>>,
    {
        self.submit_with_cancel(payload, &CancellationToken::new(), submit_fn)
            .await
    }

    /// [`submit`](Self::submit), abandoning `submit_fn` when `cancel` fires.
    pub async fn submit_with_cancel<F, Fut>(
        &self,
        payload: FormValues,
        cancel: &CancellationToken,
        submit_fn: F,
    ) -> Result<SubmitOutcome, GuardError>
    where
        F: FnOnce(FormValues) -> Fut,
        Fut: Future<Output = Result<SubmitOutcome, ApiError>>,
    {
        if let Some(remaining) = self.remaining_lockout() {
            tracing::debug!(
                remaining_secs = ceil_secs(&remaining),
                "Submission rejected: locked out"
            );
            metrics::record_submission("locked_out");
            self.notify_locked(remaining);
            return Err(GuardError::LockedOut { remaining });
        }

        let Some(_in_flight) = InFlight::acquire(&self.submitting, &self.phase) else {
            tracing::debug!("Submission rejected: already in flight");
            metrics::record_submission("in_flight");
            return Err(GuardError::InFlight);
        };

        self.set_phase(GuardPhase::Validating);
        let errors = lock(&self.form).validate_submission(&payload);
        if !errors.is_empty() {
            self.set_phase(GuardPhase::Idle);
            metrics::record_submission("invalid");
            let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
            tracing::debug!(fields = ?fields, "Submission rejected: validation failed");
            self.notifier.notify(
                NotificationKind::Failure(ErrorKind::Validation),
                &format!("Please correct the following fields: {}", fields.join(", ")),
            );
            return Err(GuardError::Validation { errors });
        }

        let sanitized = sanitize_payload(payload);

        self.set_phase(GuardPhase::Submitting);
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.set_phase(GuardPhase::Idle);
                metrics::record_submission("cancelled");
                tracing::debug!("Submission cancelled");
                return Err(GuardError::Cancelled);
            }
            result = submit_fn(sanitized) => result,
        };

        match result {
            Ok(outcome) if outcome.success => {
                lock(&self.lockout).record_success();
                if self.reset_fields_on_success {
                    lock(&self.form).reset();
                }
                self.set_phase(GuardPhase::Idle);
                metrics::record_submission("success");
                tracing::debug!("Submission succeeded");
                Ok(outcome)
            }
            Ok(outcome) => {
                let message = outcome
                    .error
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                self.notifier
                    .notify(NotificationKind::Failure(ErrorKind::Validation), &message);
                Err(self.record_failure(message))
            }
            Err(e) => Err(self.record_failure(e.user_message())),
        }
    }

    fn record_failure(&self, message: String) -> GuardError {
        let (attempt_count, locked_for) = {
            let mut lockout = lock(&self.lockout);
            let locked_for = lockout.record_failure(self.clock.now(), &self.policy);
            (lockout.attempt_count, locked_for)
        };

        metrics::record_submission("failure");
        tracing::info!(attempt_count, locked = locked_for.is_some(), "Submission failed");

        match locked_for {
            Some(duration) => {
                self.set_phase(GuardPhase::Locked);
                metrics::record_lockout();
                tracing::warn!(
                    attempt_count,
                    lockout_secs = duration.as_secs(),
                    "Too many failed submissions, locking form"
                );
                self.notify_locked(duration);
            }
            None => self.set_phase(GuardPhase::Idle),
        }

        GuardError::Failed {
            message,
            attempt_count,
            locked_for,
        }
    }

    fn notify_locked(&self, remaining: Duration) {
        self.notifier.notify(
            NotificationKind::Failure(ErrorKind::LockedOut),
            &format!(
                "{} Try again in {}s.",
                ErrorKind::LockedOut.user_message(),
                ceil_secs(&remaining)
            ),
        );
    }
}

impl std::fmt::Debug for SubmissionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionGuard")
            .field("policy", &self.policy)
            .field("lockout", &self.lockout_state())
            .field("submitting", &self.submitting.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::clock::ManualClock;
    use crate::guard::rules::FieldRules;
    use crate::notify::BufferedNotifier;
    use serde_json::{json, Value};

    fn payload(value: Value) -> FormValues {
        match value {
            Value::Object(map) => map,
            _ => panic!("payload must be an object"),
        }
    }

    fn guard() -> (SubmissionGuard, Arc<BufferedNotifier>, Arc<ManualClock>) {
        let notifier = Arc::new(BufferedNotifier::new());
        let clock = Arc::new(ManualClock::default());
        let schema =
            FormSchema::new().field("email", FieldRules::new().required("Email is required"));
        let guard = SubmissionGuard::new(schema, &GuardConfig::default(), notifier.clone())
            .with_clock(clock.clone());
        (guard, notifier, clock)
    }

    #[tokio::test]
    async fn test_success_resets_attempts_and_fields() {
        let (guard, notifier, _) = guard();

        let _ = guard
            .submit(payload(json!({"email": "a@b.co"})), |_| async {
                Ok(SubmitOutcome::failed("nope"))
            })
            .await;
        assert_eq!(guard.lockout_state().attempt_count, 1);

        let outcome = guard
            .submit(payload(json!({"email": "a@b.co"})), |_| async {
                Ok(SubmitOutcome::ok())
            })
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(guard.lockout_state(), LockoutState::default());
        assert_eq!(guard.field("email"), Some(FieldState::default()));
        assert_eq!(guard.phase(), GuardPhase::Idle);
        assert_eq!(notifier.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_validation_failure_is_not_an_attempt() {
        let (guard, notifier, _) = guard();
        let mut called = false;

        let err = guard
            .submit(payload(json!({"email": "  "})), |_| {
                called = true;
                async { Ok(SubmitOutcome::ok()) }
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GuardError::Validation { ref errors } if errors["email"] == "Email is required"
        ));
        assert!(!called);
        assert_eq!(guard.lockout_state().attempt_count, 0);
        assert_eq!(notifier.count_failures(ErrorKind::Validation), 1);
        assert!(guard.field("email").unwrap().touched);
    }

    #[tokio::test]
    async fn test_submit_fn_receives_sanitized_payload() {
        let (guard, _, _) = guard();

        guard
            .submit(
                payload(json!({"email": " a@b.co ", "note": "<b>hi</b>", "count": 3})),
                |values| async move {
                    assert_eq!(values["email"], "a@b.co");
                    assert_eq!(values["note"], "&lt;b&gt;hi&lt;/b&gt;");
                    assert_eq!(values["count"], 3);
                    Ok(SubmitOutcome::ok())
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_lockout_expires_lazily_and_escalates() {
        let (guard, _, clock) = guard();
        let body = json!({"email": "a@b.co"});

        for _ in 0..5 {
            let _ = guard
                .submit(payload(body.clone()), |_| async {
                    Ok(SubmitOutcome::failed("wrong"))
                })
                .await;
        }
        assert_eq!(guard.phase(), GuardPhase::Locked);
        assert_eq!(guard.remaining_lockout(), Some(Duration::from_secs(30)));

        clock.advance(Duration::from_secs(30));
        assert_eq!(guard.phase(), GuardPhase::Idle);
        assert_eq!(guard.remaining_lockout(), None);

        let err = guard
            .submit(payload(body), |_| async { Ok(SubmitOutcome::failed("wrong")) })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GuardError::Failed { attempt_count: 6, locked_for: Some(d), .. }
                if d == Duration::from_secs(60)
        ));
    }

    #[tokio::test]
    async fn test_cancellation_is_not_counted() {
        let (guard, notifier, _) = guard();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = guard
            .submit_with_cancel(payload(json!({"email": "a@b.co"})), &cancel, |_| async {
                std::future::pending::<Result<SubmitOutcome, ApiError>>().await
            })
            .await
            .unwrap_err();

        assert!(matches!(err, GuardError::Cancelled));
        assert_eq!(guard.lockout_state().attempt_count, 0);
        assert!(notifier.snapshot().is_empty());

        // The in-flight flag was released.
        guard
            .submit(payload(json!({"email": "a@b.co"})), |_| async {
                Ok(SubmitOutcome::ok())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_abandoned_submission_releases_form() {
        let (guard, notifier, _) = guard();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            guard.submit(payload(json!({"email": "a@b.co"})), |_| async {
                std::future::pending::<Result<SubmitOutcome, ApiError>>().await
            }),
        )
        .await;

        assert!(abandoned.is_err());
        assert_eq!(guard.phase(), GuardPhase::Idle);
        assert_eq!(guard.lockout_state().attempt_count, 0);
        assert!(notifier.snapshot().is_empty());

        guard
            .submit(payload(json!({"email": "a@b.co"})), |_| async {
                Ok(SubmitOutcome::ok())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_pipeline_errors_are_not_renotified() {
        let (guard, notifier, _) = guard();

        let err = guard
            .submit(payload(json!({"email": "a@b.co"})), |_| async {
                Err(ApiError::Unreachable("connection refused".into()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, GuardError::Failed { attempt_count: 1, .. }));
        assert!(notifier.snapshot().is_empty());
    }
}
