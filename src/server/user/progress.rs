use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::dto::UpdateProgressRequest;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::validate_percentage;
use crate::types::{ItemKind, Progress};

use super::access::{ReaderContext, require_grimoire_access, require_module_access};

pub async fn get_me(auth: RequireAuth) -> impl IntoResponse {
    Json(ApiResponse::success(auth.user))
}

pub async fn list_progress(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let progress = state
        .store
        .list_user_progress(&auth.user.id)
        .api_err("Failed to list progress")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(progress)))
}

/// Records reading progress on a grimoire or module the caller can open.
pub async fn update_progress(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
    Json(req): Json<UpdateProgressRequest>,
) -> impl IntoResponse {
    validate_percentage(req.percentage)?;

    let store = state.store.as_ref();
    let ctx = ReaderContext::load(store, Some(&auth.user))?;

    let item_kind = if let Some(grimoire) = store
        .get_grimoire(&item_id)
        .api_err("Failed to get grimoire")?
    {
        require_grimoire_access(&state, &ctx, &grimoire)?;
        ItemKind::Grimoire
    } else if let Some(module) = store.get_module(&item_id).api_err("Failed to get module")? {
        require_module_access(&state, &ctx, &module)?;
        ItemKind::Module
    } else {
        return Err(ApiError::not_found("Content item not found"));
    };

    let now = Utc::now();
    let progress = Progress {
        user_id: auth.user.id.clone(),
        item_id,
        item_kind,
        percentage: req.percentage,
        completed_at: (req.percentage >= 100.0).then_some(now),
        updated_at: now,
    };

    let stored = store
        .record_progress(&progress)
        .api_err("Failed to record progress")?;

    tracing::debug!(
        user_id = %stored.user_id,
        item_id = %stored.item_id,
        percentage = stored.percentage,
        "Progress recorded"
    );

    Ok::<_, ApiError>(Json(ApiResponse::success(stored)))
}
