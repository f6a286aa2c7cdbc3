//! Bearer access-token extractor for protected routes

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthError, AuthService, TokenError};
use crate::error::{ErrorDetails, ErrorResponse};

/// The user asserted by a verified access token
///
/// Only the token is checked; whether the account still exists is up to the handler.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

fn reject(code: &str, message: &str) -> Response {
    let body = ErrorResponse {
        error: ErrorDetails {
            code: code.to_string(),
            message: message.to_string(),
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| reject("MISSING_TOKEN", "Bearer access token required"))?;

        let user_id = Arc::<AuthService>::from_ref(state)
            .authenticate(bearer.token())
            .map_err(|e| match e {
                AuthError::InvalidAccessToken(TokenError::Expired) => {
                    reject("TOKEN_EXPIRED", "Access token has expired")
                }
                _ => reject("INVALID_TOKEN", "Invalid access token"),
            })?;

        Ok(AuthenticatedUser { user_id })
    }
}
