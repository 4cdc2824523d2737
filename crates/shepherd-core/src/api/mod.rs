//! REST API client for the church-management service.
//!
//! The API uses bearer token authentication obtained from `/auth/login`.
//! A 401 or 403 on any other call means the token is no longer accepted;
//! callers hand such errors to `SessionSync::handle_api_error`.

pub mod client;
pub mod error;

pub use client::{ApiClient, DevotionPage, LoginOutcome};
pub use error::ApiError;
