use chrono::Utc;

use super::parse_token;
use crate::server::AppState;
use crate::types::{Token, User};

#[derive(Debug)]
pub enum TokenValidationError {
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    InternalError,
}

pub struct ValidatedToken {
    pub token: Token,
    pub user: User,
}

/// Extracts the token from a Bearer authorization header.
/// Returns Ok(None) when no header is present.
pub fn extract_bearer_token(auth_header: Option<&str>) -> Result<Option<String>, TokenValidationError> {
    match auth_header {
        Some(header) => header
            .strip_prefix("Bearer ")
            .map(|t| Some(t.trim().to_string()))
            .ok_or(TokenValidationError::InvalidScheme),
        None => Ok(None),
    }
}

/// Resolves a raw token to its stored row and owning user.
///
/// Unknown, mismatched, and orphaned tokens are all reported as
/// `InvalidToken` so callers cannot probe which check failed.
pub fn validate_token(
    state: &AppState,
    raw_token: &str,
) -> Result<ValidatedToken, TokenValidationError> {
    let store = state.store.as_ref();
    let parsed = parse_token(raw_token).map_err(|_| TokenValidationError::InvalidToken)?;

    let token = store
        .get_token_by_lookup(parsed.lookup)
        .map_err(|_| TokenValidationError::InternalError)?
        .ok_or(TokenValidationError::InvalidToken)?;

    let matches = state.hasher.verify(raw_token, &token.token_hash).map_err(|e| {
        tracing::error!(token_id = %token.id, error = %e, "Stored token hash is unreadable");
        TokenValidationError::InternalError
    })?;
    if !matches {
        return Err(TokenValidationError::InvalidToken);
    }

    if token.expires_at.is_some_and(|at| at <= Utc::now()) {
        return Err(TokenValidationError::TokenExpired);
    }

    let user = store
        .get_user(&token.user_id)
        .map_err(|_| TokenValidationError::InternalError)?
        .ok_or(TokenValidationError::InvalidToken)?;

    if let Err(e) = store.update_token_last_used(&token.id) {
        tracing::warn!("Failed to update token last_used_at: {e}");
    }

    Ok(ValidatedToken { token, user })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token(Some("Bearer templo_abc")).unwrap(),
            Some("templo_abc".to_string())
        );
        assert!(extract_bearer_token(None).unwrap().is_none());
        assert!(matches!(
            extract_bearer_token(Some("Basic eC10b2tlbjpzZWNyZXQ=")),
            Err(TokenValidationError::InvalidScheme)
        ));
    }
}
