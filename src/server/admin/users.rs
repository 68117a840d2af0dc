use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::{RequireAdmin, issue_token};
use crate::server::AppState;
use crate::server::dto::{
    CreateTokenResponse, CreateUserRequest, CreateUserTokenRequest, PaginationParams,
    TokenResponse, UpdateUserRequest,
};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
};
use crate::server::validation::{normalize_email, parse_role};
use crate::types::{Role, User};

use super::tokens::token_to_response;

pub async fn create_user(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> impl IntoResponse {
    let email = normalize_email(&req.email).map_err(ApiError::bad_request)?;
    let role = match req.role.as_deref() {
        Some(name) => parse_role(name)?,
        None => Role::default(),
    };

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        display_name: req.display_name,
        role,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .create_user(&user)
        .or_conflict("User with this email already exists", "Failed to create user")?;

    tracing::info!(user_id = %user.id, role = %user.role, "User created");

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

pub async fn list_users(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let users = state
        .store
        .list_users(cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list users")?;

    Ok::<_, ApiError>(Json(PaginatedResponse::from_overfetch(
        users,
        DEFAULT_PAGE_SIZE as usize,
        |u| u.id.clone(),
    )))
}

pub async fn get_user(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(user)))
}

/// Changes a user's display name or role. An admin cannot demote itself.
pub async fn update_user(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> impl IntoResponse {
    let mut user = state
        .store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    if let Some(name) = req.role.as_deref() {
        let role = parse_role(name)?;
        if user.id == admin.user.id && !role.is_admin() {
            return Err(ApiError::bad_request("Cannot remove your own admin role"));
        }
        if role != user.role {
            tracing::info!(user_id = %user.id, from = %user.role, to = %role, "Role changed");
        }
        user.role = role;
    }
    if let Some(display_name) = req.display_name {
        user.display_name = Some(display_name);
    }
    user.updated_at = Utc::now();

    state
        .store
        .update_user(&user)
        .api_err("Failed to update user")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(user)))
}

pub async fn delete_user(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    if user.id == admin.user.id {
        return Err(ApiError::bad_request("Cannot delete the current user"));
    }

    state
        .store
        .delete_user(&user.id)
        .api_err("Failed to delete user")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_user_tokens(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let tokens = state
        .store
        .list_user_tokens(&user.id)
        .api_err("Failed to list user tokens")?;

    let responses: Vec<TokenResponse> = tokens.into_iter().map(token_to_response).collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(responses)))
}

pub async fn create_user_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateUserTokenRequest>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let expires_at = match req.expires_in_seconds {
        Some(seconds) if seconds < 0 => {
            return Err(ApiError::bad_request(
                "expires_in_seconds cannot be negative",
            ));
        }
        Some(seconds) => Some(
            Duration::try_seconds(seconds)
                .and_then(|d| Utc::now().checked_add_signed(d))
                .ok_or_else(|| ApiError::bad_request("expires_in_seconds is too large"))?,
        ),
        None => None,
    };

    let (token, raw_token) = issue_token(state.store.as_ref(), &state.hasher, &user.id, expires_at)
        .api_err("Failed to create token")?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreateTokenResponse {
            token: raw_token,
            metadata: token_to_response(token),
        })),
    ))
}
