//! Authentication state subsystem.
//!
//! # Data Flow
//! ```text
//! login response
//!     → credentials.rs (CredentialStore::set)
//!
//! 401 from backend:
//!     → refresh.rs (single-flight exchange of the refresh token)
//!     → credentials.rs (replace on success, clear on failure)
//!     → session.rs (Refreshed / Expired broadcast)
//! ```
//!
//! # Design Decisions
//! - Storage is injected; nothing reads tokens from globals
//! - At most one refresh is in flight per store

pub mod credentials;
pub mod refresh;
pub mod session;

pub use credentials::{Credential, CredentialStore, InMemoryCredentialStore};
pub use refresh::{RefreshCoordinator, RefreshError, RefreshOutcome};
pub use session::SessionEvent;
