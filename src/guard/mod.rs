//! Form submission guard.
//!
//! # Responsibilities
//! - Declarative per-field validation (`rules`, `form`)
//! - Idempotent escaping of outbound text (`sanitize`)
//! - Re-entrancy protection and brute-force lockout (`submission`, `lockout`)
//!
//! # Data Flow
//! ```text
//! payload → lockout check → in-flight flag → validate → sanitize → submit_fn
//!                                                                    ↓
//!                                  record_success / record_failure ←─┘
//! ```

pub mod clock;
pub mod form;
pub mod lockout;
pub mod rules;
pub mod sanitize;
pub mod submission;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use form::{FieldState, FormState, FormValues};
pub use lockout::{LockoutPolicy, LockoutState};
pub use rules::{FieldRules, FormSchema};
pub use sanitize::{sanitize_payload, sanitize_str, sanitize_value};
pub use submission::SubmissionGuard;
pub use types::{GuardError, GuardPhase, SubmitOutcome};
