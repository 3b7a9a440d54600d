//! Authentication HTTP handlers.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use shared_types::{
    AuthStatusResponse, CompleteRegistrationRequest, CompleteRegistrationResponse,
    MessageResponse, ProfileDetails, RegistrationStatusResponse, UserSummary,
};

use super::dispatcher::{CallbackDispatcher, CallbackParams};
use super::middleware::{
    authenticate, build_cookie, clear_cookie, extract_cookie, GatePass, OAUTH_STATE_COOKIE,
    SESSION_COOKIE,
};
use crate::error::{ApiError, ApiResult, ErrorResponse, LOGIN_ENTRY_POINT};
use crate::AppState;

/// How long a started login may take before its state cookie lapses.
const OAUTH_STATE_MAX_AGE_SECS: i64 = 600;

fn with_cookies(mut response: Response, cookies: &[String]) -> Response {
    for cookie in cookies {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Invalid Set-Cookie value: {}", e),
        }
    }
    response
}

/// Start the Google OAuth login flow.
///
/// Redirects to Google's consent screen with a fresh `state`, remembered in a
/// short-lived cookie and checked again on callback.
pub async fn google_login(State(state): State<AppState>) -> Response {
    let csrf_state = uuid::Uuid::new_v4().to_string();
    let auth_url = state.provider.authorization_url(&csrf_state);

    let cookie = build_cookie(
        OAUTH_STATE_COOKIE,
        &csrf_state,
        OAUTH_STATE_MAX_AGE_SECS,
        state.config.is_production(),
    );
    with_cookies(Redirect::to(&auth_url).into_response(), &[cookie])
}

/// Handle the Google OAuth callback. Always answers with a redirect.
pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let expected_state = extract_cookie(&headers, OAUTH_STATE_COOKIE);
    let outcome = CallbackDispatcher::new(&state)
        .dispatch(params, expected_state.as_deref())
        .await;

    let mut cookies = vec![clear_cookie(OAUTH_STATE_COOKIE)];
    if let Some(established) = &outcome.session {
        let max_age = (established.session.expires_at - established.session.created_at).num_seconds();
        cookies.push(build_cookie(
            SESSION_COOKIE,
            &established.cookie_token,
            max_age,
            state.config.is_production(),
        ));
    }

    with_cookies(Redirect::to(&outcome.redirect_to).into_response(), &cookies)
}

/// Current authentication status.
pub async fn auth_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<AuthStatusResponse>> {
    let user = match authenticate(&state, &headers)? {
        Some(session) => state.directory.lookup(&session.provider_id)?,
        None => None,
    };

    Ok(Json(AuthStatusResponse {
        authenticated: user.is_some(),
        user: user.as_ref().map(UserSummary::from),
    }))
}

/// Parse a registration body. An empty body reads as `{}` so that a missing
/// phone is reported as such.
fn parse_registration(body: &[u8]) -> ApiResult<CompleteRegistrationRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CompleteRegistrationRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

/// Record the registration-completion fields. Phone is mandatory.
pub async fn complete_registration(
    State(state): State<AppState>,
    Extension(pass): Extension<GatePass>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<CompleteRegistrationResponse>> {
    let body = body.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let body = parse_registration(&body)?;
    let fields = ProfileDetails {
        phone: body.phone,
        date_of_birth: body.date_of_birth,
        address: body.address,
        preferences: body.preferences,
    };

    let user = state
        .directory
        .complete_registration(&pass.session.provider_id, fields)?;

    Ok(Json(CompleteRegistrationResponse {
        success: true,
        message: "Registration completed successfully".to_string(),
        user: UserSummary::from(&user),
    }))
}

/// Which completion fields the current user has supplied.
pub async fn registration_status(
    Extension(pass): Extension<GatePass>,
) -> ApiResult<Json<RegistrationStatusResponse>> {
    let user = pass.user.ok_or(ApiError::UserNotFound)?;

    Ok(Json(RegistrationStatusResponse {
        is_registration_complete: user.is_registration_complete,
        registration_completed_at: user.registration_completed_at,
        fields: (&user.profile).into(),
    }))
}

/// Destroy the session and clear the session cookie.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let session = authenticate(&state, &headers)
        .map_err(|e| ApiError::SessionTeardownFailed(e.to_string()))?;
    if let Some(session) = session {
        state
            .sessions
            .destroy(&session.id)
            .map_err(|e| ApiError::SessionTeardownFailed(e.to_string()))?;
        tracing::info!(provider_id = %session.provider_id, "Logged out");
    }

    let body = Json(MessageResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    });
    Ok(with_cookies(
        body.into_response(),
        &[clear_cookie(SESSION_COOKIE)],
    ))
}

/// Static landing point for failed logins.
pub async fn auth_failure() -> impl IntoResponse {
    (
        StatusCode::UNAUTHORIZED,
        Json(
            ErrorResponse::new(
                "AuthenticationFailed",
                Some("Google authentication failed".to_string()),
            )
            .with_redirect(LOGIN_ENTRY_POINT),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registration_body_reads_as_empty_object() {
        let request = parse_registration(b"  ").unwrap();
        assert!(request.phone.is_none());
    }

    #[test]
    fn test_mistyped_registration_body_is_invalid_request() {
        let err = parse_registration(br#"{"phone": 5551}"#).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }
}
