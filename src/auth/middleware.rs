use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::AUTHORIZATION, header::WWW_AUTHENTICATE, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::helpers::{TokenValidationError, ValidatedToken, extract_bearer_token, validate_token};
use crate::server::AppState;
use crate::types::{Token, User};

/// Extractor that requires any valid authentication
pub struct RequireAuth {
    pub token: Token,
    pub user: User,
}

/// Extractor that requires a user holding the admin role
pub struct RequireAdmin {
    pub token: Token,
    pub user: User,
}

/// Extractor for routes that anonymous visitors may also call.
/// A present but invalid token is still rejected.
pub struct OptionalAuth {
    pub user: Option<User>,
}

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    NotAdmin,
    InternalError,
}

impl From<TokenValidationError> for AuthError {
    fn from(e: TokenValidationError) -> Self {
        match e {
            TokenValidationError::InvalidScheme => AuthError::InvalidScheme,
            TokenValidationError::InvalidToken => AuthError::InvalidToken,
            TokenValidationError::TokenExpired => AuthError::TokenExpired,
            TokenValidationError::InternalError => AuthError::InternalError,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "Invalid authorization scheme"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "Admin access required"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"templo\""),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let validated = extract_and_validate_token(parts, state)?.ok_or(AuthError::MissingAuth)?;
        Ok(RequireAuth {
            token: validated.token,
            user: validated.user,
        })
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let validated = extract_and_validate_token(parts, state)?.ok_or(AuthError::MissingAuth)?;

        if !validated.user.is_admin() {
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin {
            token: validated.token,
            user: validated.user,
        })
    }
}

impl FromRequestParts<Arc<AppState>> for OptionalAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let validated = extract_and_validate_token(parts, state)?;
        Ok(OptionalAuth {
            user: validated.map(|v| v.user),
        })
    }
}

fn extract_and_validate_token(
    parts: &Parts,
    state: &Arc<AppState>,
) -> Result<Option<ValidatedToken>, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(raw_token) = extract_bearer_token(auth_header)? else {
        return Ok(None);
    };

    Ok(Some(validate_token(state, &raw_token)?))
}
