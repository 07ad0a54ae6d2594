use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::AppState;
use crate::types::UserId;

/// Header carrying the chat user on whose behalf a mutation is made.
pub const ACTING_USER_HEADER: &str = "x-acting-user";

/// Extractor that only checks the shared API token.
pub struct RequireToken;

/// Extractor that checks the API token and names the acting chat user.
pub struct Caller(pub UserId);

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    MissingActingUser,
    InvalidActingUser,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "Invalid authorization scheme"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthError::MissingActingUser => {
                (StatusCode::BAD_REQUEST, "X-Acting-User header required")
            }
            AuthError::InvalidActingUser => {
                (StatusCode::BAD_REQUEST, "X-Acting-User must be a numeric user id")
            }
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                "WWW-Authenticate",
                HeaderValue::from_static("Bearer realm=\"hallpass\""),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireToken {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        check_token(parts, state)?;
        Ok(RequireToken)
    }
}

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        check_token(parts, state)?;

        let raw = parts
            .headers
            .get(ACTING_USER_HEADER)
            .ok_or(AuthError::MissingActingUser)?
            .to_str()
            .map_err(|_| AuthError::InvalidActingUser)?;
        let user = raw
            .trim()
            .parse()
            .map_err(|_| AuthError::InvalidActingUser)?;

        Ok(Caller(user))
    }
}

fn check_token(parts: &Parts, state: &AppState) -> Result<(), AuthError> {
    if !state.requires_token() {
        return Ok(());
    }

    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingAuth)?;
    let presented = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidScheme)?;

    if state.token_matches(presented.trim()) {
        Ok(())
    } else {
        Err(AuthError::InvalidToken)
    }
}
