//! Authentication module for the signed-in session.
//!
//! This module provides:
//! - `Credential` / `Profile`: what a successful login yields
//! - `SessionSync`: keeps the in-memory `SessionState` and durable storage in step
//!
//! The session is restored from storage once at startup and cleared on sign
//! out or when the API rejects the token.

pub mod credential;
pub mod session;

pub use credential::{Credential, Profile};
pub use session::{
    SessionError, SessionPhase, SessionState, SessionSync, SignOutReason, FALLBACK_DISPLAY_NAME,
};
