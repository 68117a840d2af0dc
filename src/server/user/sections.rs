use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::auth::OptionalAuth;
use crate::server::AppState;
use crate::server::dto::GrimoireSummary;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};

use super::access::{ReaderContext, require_grimoire_access, section_grimoires};

pub async fn list_sections(
    auth: OptionalAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let admin = auth.user.as_ref().is_some_and(|u| u.is_admin());

    let sections = state
        .store
        .list_sections(!admin)
        .api_err("Failed to list sections")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(sections)))
}

pub async fn list_section_grimoires(
    auth: OptionalAuth,
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let ctx = ReaderContext::load(store, auth.user.as_ref())?;

    let section = store
        .get_section_by_slug(&slug)
        .api_err("Failed to get section")?
        .filter(|s| s.published || ctx.is_admin())
        .or_not_found("Section not found")?;

    let (grimoires, unlocked) = section_grimoires(&state, &ctx, &section.id)?;

    let summaries: Vec<GrimoireSummary> = grimoires
        .into_iter()
        .map(|g| {
            let is_unlocked = unlocked.contains(&g.id);
            let accessible = is_unlocked
                && ctx.role_allows(g.required_role)
                && ctx.owns(g.is_paid, &g.id);
            let progress = ctx.progress_of(&g.id);
            GrimoireSummary::new(g, is_unlocked, accessible, progress)
        })
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(summaries)))
}

pub async fn get_grimoire(
    auth: OptionalAuth,
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let ctx = ReaderContext::load(store, auth.user.as_ref())?;

    let grimoire = store
        .get_grimoire_by_slug(&slug)
        .api_err("Failed to get grimoire")?
        .or_not_found("Grimoire not found")?;

    require_grimoire_access(&state, &ctx, &grimoire)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(grimoire)))
}
