//! Authentication HTTP handlers
//!
//! Endpoints for registration, sign-in and the refresh-token session lifecycle.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;

use super::AuthenticatedUser;
use crate::auth::cookie::{clear_refresh_cookie, refresh_cookie, refresh_token_from};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    LoginRequest, LoginResponse, LogoutAllResponse, RefreshResponse, RegisterRequest,
    UserResponse,
};
use crate::state::AppState;

/// POST /auth/signup - Register a new account
pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Json(req) = payload?;

    let user = state.auth_service.register(req).await?;

    Ok(Json(user.into()))
}

/// POST /auth/signin - Verify credentials, return an access token and set the refresh cookie
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let Json(req) = payload?;

    let issued = state.auth_service.login(req).await?;
    let cookie = refresh_cookie(issued.refresh_token, state.auth_service.refresh_token_ttl());

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: format!("User {} logged in", issued.user.display_name),
            access_token: issued.access_token,
        }),
    ))
}

/// POST /auth/refresh - Mint a new access token from the refresh cookie
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<RefreshResponse>)> {
    let token = refresh_token_from(&jar)
        .ok_or_else(|| ApiError::Unauthorized("Refresh token missing".to_string()))?;

    let refreshed = state.auth_service.refresh(&token).await?;

    let jar = match refreshed.rotated {
        Some(rotated) => jar.add(refresh_cookie(
            rotated.refresh_token,
            state.auth_service.refresh_token_ttl(),
        )),
        None => jar,
    };

    Ok((
        jar,
        Json(RefreshResponse {
            access_token: refreshed.access_token,
        }),
    ))
}

/// POST /auth/signout - Revoke the session behind the refresh cookie
pub async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, StatusCode)> {
    if let Some(token) = refresh_token_from(&jar) {
        state.auth_service.logout(&token).await?;
    }

    Ok((jar.add(clear_refresh_cookie()), StatusCode::NO_CONTENT))
}

/// POST /auth/logout-all - Revoke all sessions for the current user
pub async fn logout_all(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<LogoutAllResponse>)> {
    let revoked_sessions = state.auth_service.logout_all(user.user_id).await?;

    Ok((
        jar.add(clear_refresh_cookie()),
        Json(LogoutAllResponse { revoked_sessions }),
    ))
}

/// GET /auth/me - Get current authenticated user
pub async fn get_current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<UserResponse>> {
    let user = state.auth_service.current_user(user.user_id).await?;

    Ok(Json(user.into()))
}
