use axum::{
    extract::State,
    http::{HeaderMap, Uri},
    Extension, Json,
};
use shared_types::{
    BasicProfileResponse, FullProfile, ProfileResponse, RootResponse, UserListResponse,
    UserSummary,
};

use crate::auth::{middleware::authenticate, GatePass};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Liveness plus a summary of the caller's session.
pub async fn root(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<RootResponse>> {
    let user = match authenticate(&state, &headers)? {
        Some(session) => state.directory.lookup(&session.provider_id)?,
        None => None,
    };

    Ok(Json(RootResponse {
        message: "Auth gateway is running".to_string(),
        status: "ok".to_string(),
        authenticated: user.is_some(),
        user: user.as_ref().map(UserSummary::from),
    }))
}

// Registration-complete tier
pub async fn profile(Extension(pass): Extension<GatePass>) -> ApiResult<Json<ProfileResponse>> {
    let user = pass.user.ok_or(ApiError::UserNotFound)?;
    Ok(Json(ProfileResponse {
        user: FullProfile::from(&user),
    }))
}

// Authenticated tier
pub async fn basic_profile(
    Extension(pass): Extension<GatePass>,
) -> ApiResult<Json<BasicProfileResponse>> {
    let user = pass.user.ok_or(ApiError::UserNotFound)?;
    Ok(Json(BasicProfileResponse {
        user: UserSummary::from(&user),
    }))
}

/// Diagnostic directory listing. Authenticated tier, and hidden entirely in
/// production.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<UserListResponse>> {
    if state.config.is_production() {
        return Err(ApiError::NotFound("Route /api/users".to_string()));
    }

    let users: Vec<UserSummary> = state.directory.list()?.iter().map(UserSummary::from).collect();
    Ok(Json(UserListResponse {
        count: users.len(),
        users,
    }))
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Route {}", uri.path()))
}
