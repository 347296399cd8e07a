//! Identity domain - wraps the external auth provider behind an adapter
//!
//! Responsibilities:
//! - Current-user resolution from a bearer session token
//! - Sign-in/sign-out session lifecycle
//! - Session-change notifications for callers that re-run access decisions

pub mod models;
pub mod provider;
pub mod session;

pub use models::User;
pub use provider::{IdentityProvider, SessionChange, SessionIdentityProvider};
pub use session::{Session, SessionStore, SessionToken};
