use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::{Error as StoreError, Result as StoreResult};

pub const DEFAULT_PAGE_SIZE: i32 = 50;

/// `{ "data": ..., "error": ... }` envelope shared by every JSON endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn failure(message: String) -> Self {
        Self {
            data: None,
            error: Some(message),
        }
    }
}

/// A page of a keyset-paginated listing. The cursor is the last row's id.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Builds a page from a query that fetched up to `page_size + 1` rows.
    /// The extra row only signals that another page exists.
    pub fn from_overfetch(mut rows: Vec<T>, page_size: usize, cursor: impl Fn(&T) -> String) -> Self {
        let has_more = rows.len() > page_size;
        rows.truncate(page_size);
        let next_cursor = if has_more { rows.last().map(cursor) } else { None };
        Self {
            data: rows,
            next_cursor,
            has_more,
        }
    }
}

/// An error response. 5xx messages are generic; details only go to the log.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let challenge = self.status == StatusCode::UNAUTHORIZED;
        let mut response =
            (self.status, Json(ApiResponse::<()>::failure(self.message))).into_response();
        if challenge {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"templo\""),
            );
        }
        response
    }
}

/// Maps store results onto API errors, logging the underlying cause.
pub trait StoreResultExt<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError>;

    /// Like `api_err`, but a uniqueness violation becomes 409 with `conflict`.
    fn or_conflict(self, conflict: &'static str, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| {
            tracing::error!(error = %e, "{message}");
            ApiError::internal(message)
        })
    }

    fn or_conflict(self, conflict: &'static str, message: &'static str) -> Result<T, ApiError> {
        match self {
            Err(StoreError::AlreadyExists) => Err(ApiError::conflict(conflict)),
            other => other.api_err(message),
        }
    }
}

pub trait StoreOptionExt<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreOptionExt<T> for Option<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(message))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    #[test]
    fn test_page_from_overfetch() {
        let page = PaginatedResponse::from_overfetch(vec![1, 2, 3], 2, |n| n.to_string());
        assert_eq!(page.data, vec![1, 2]);
        assert_eq!(page.next_cursor.as_deref(), Some("2"));
        assert!(page.has_more);

        let last = PaginatedResponse::from_overfetch(vec![1, 2], 2, |n| n.to_string());
        assert!(!last.has_more);
        assert!(last.next_cursor.is_none());
    }

    #[test]
    fn test_or_conflict_maps_uniqueness_only() {
        let dup: StoreResult<()> = Err(StoreError::AlreadyExists);
        assert_eq!(
            dup.or_conflict("taken", "failed").unwrap_err().status,
            StatusCode::CONFLICT
        );

        let other: StoreResult<()> = Err(StoreError::NotFound);
        assert_eq!(
            other.or_conflict("taken", "failed").unwrap_err().status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = ApiError::unauthorized("Authentication required").into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[WWW_AUTHENTICATE],
            "Bearer realm=\"templo\""
        );
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"], serde_json::Value::Null);
        assert_eq!(json["error"], "Authentication required");
    }
}
