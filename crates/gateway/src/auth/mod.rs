//! Authentication module for Google OAuth login with server-side sessions.
//!
//! This module provides:
//! - Provider profile normalization and session resolution
//! - The OAuth callback dispatcher and its redirect policy
//! - Signed session cookies
//! - `require_session` / `require_registration` access-gate middleware

pub mod dispatcher;
mod handlers;
pub mod jwt;
pub mod middleware;
pub mod normalize;
pub mod provider;
pub mod resolver;
pub mod types;

pub use handlers::{
    auth_failure, auth_status, complete_registration, google_callback, google_login, logout,
    registration_status,
};
pub use middleware::{require_registration, require_session, AccessTier, GatePass};
