use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::CreatePurchaseRequest;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::types::{ItemKind, Purchase};

/// Purchases attach to grimoires and courses. Modules inherit their course's.
fn resolve_purchasable(state: &AppState, item_id: &str) -> Result<ItemKind, ApiError> {
    if state
        .store
        .get_grimoire(item_id)
        .api_err("Failed to get grimoire")?
        .is_some()
    {
        return Ok(ItemKind::Grimoire);
    }
    if state
        .store
        .get_course(item_id)
        .api_err("Failed to get course")?
        .is_some()
    {
        return Ok(ItemKind::Course);
    }
    Err(ApiError::not_found("Item not found"))
}

pub async fn create_purchase(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(req): Json<CreatePurchaseRequest>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user(&user_id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let item_kind = resolve_purchasable(&state, &req.item_id)?;

    let purchase = Purchase {
        user_id: user.id,
        item_id: req.item_id,
        item_kind,
        created_at: Utc::now(),
    };

    state
        .store
        .create_purchase(&purchase)
        .api_err("Failed to record purchase")?;

    tracing::info!(
        user_id = %purchase.user_id,
        item_id = %purchase.item_id,
        kind = %purchase.item_kind,
        "Purchase recorded"
    );

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(purchase))))
}

pub async fn list_purchases(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user(&user_id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let purchases = state
        .store
        .list_user_purchases(&user.id)
        .api_err("Failed to list purchases")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(purchases)))
}

pub async fn delete_purchase(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path((user_id, item_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_purchase(&user_id, &item_id)
        .api_err("Failed to delete purchase")?;

    if !deleted {
        return Err(ApiError::not_found("Purchase not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
