//! Access gate: session predicates and the middleware protecting routes.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared_types::UserRecord;

use super::jwt;
use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use crate::AppState;

pub const SESSION_COOKIE: &str = "gateway_session";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Route classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    Public,
    Authenticated,
    RegistrationComplete,
}

/// What a request that passed the gate carries into its handler.
///
/// `user` is reloaded from the directory on every request; it is `None` only
/// when the session outlived its user record.
#[derive(Debug, Clone)]
pub struct GatePass {
    pub session: Session,
    pub user: Option<UserRecord>,
}

/// The live session named by the request's session cookie, if any.
///
/// Forged, expired, or destroyed sessions all come back as `None`.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<Option<Session>> {
    let Some(token) = extract_cookie(headers, SESSION_COOKIE) else {
        return Ok(None);
    };

    let claims = match jwt::validate_token(&state.config.session_secret, &token) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!("Rejected session cookie: {}", e);
            return Ok(None);
        }
    };

    let session = state.sessions.get(&claims.sid)?;
    Ok(session.filter(|s| s.provider_id == claims.sub))
}

pub fn is_authenticated(state: &AppState, headers: &HeaderMap) -> ApiResult<bool> {
    Ok(authenticate(state, headers)?.is_some())
}

/// True iff authenticated and the directory's current record says
/// registration is complete.
pub fn is_registration_complete(state: &AppState, headers: &HeaderMap) -> ApiResult<bool> {
    let Some(session) = authenticate(state, headers)? else {
        return Ok(false);
    };
    Ok(state
        .directory
        .lookup(&session.provider_id)?
        .is_some_and(|u| u.is_registration_complete))
}

/// Evaluate the gate for a tier. Public routes pass without a session.
pub fn check_access(
    state: &AppState,
    headers: &HeaderMap,
    tier: AccessTier,
) -> ApiResult<Option<GatePass>> {
    if tier == AccessTier::Public {
        return Ok(None);
    }

    let session = authenticate(state, headers)?.ok_or(ApiError::Unauthenticated)?;
    let user = state.directory.lookup(&session.provider_id)?;

    if tier == AccessTier::RegistrationComplete {
        match &user {
            None => return Err(ApiError::Unauthenticated),
            Some(u) if !u.is_registration_complete => return Err(ApiError::RegistrationIncomplete),
            Some(_) => {}
        }
    }

    Ok(Some(GatePass { session, user }))
}

async fn gate(state: AppState, tier: AccessTier, mut request: Request<Body>, next: Next) -> Response {
    match check_access(&state, request.headers(), tier) {
        Ok(Some(pass)) => {
            request.extensions_mut().insert(pass);
            next.run(request).await
        }
        Ok(None) => next.run(request).await,
        Err(err) => {
            tracing::debug!(?tier, path = %request.uri().path(), "Access denied: {}", err);
            err.into_response()
        }
    }
}

/// Middleware for routes that need an active session.
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn require_session(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    gate(state, AccessTier::Authenticated, request, next).await
}

/// Middleware for routes that need an active session and a completed
/// registration.
pub async fn require_registration(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    gate(state, AccessTier::RegistrationComplete, request, next).await
}

pub fn extract_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    for cookie_header in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = cookie_header.to_str() else {
            continue;
        };
        for cookie_str in cookie_header.split(';') {
            if let Ok(cookie) = cookie::Cookie::parse(cookie_str.trim()) {
                if cookie.name() == cookie_name {
                    return Some(cookie.value().to_string());
                }
            }
        }
    }

    None
}

/// Build a `Set-Cookie` value.
pub fn build_cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        name, value, max_age_secs, secure
    )
}

/// Build a `Set-Cookie` value that deletes the cookie.
pub fn clear_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name)
}
