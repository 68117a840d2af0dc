use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{CreateSectionRequest, UpdateSectionRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_slug, validate_title};
use crate::types::Section;

pub async fn create_section(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSectionRequest>,
) -> impl IntoResponse {
    validate_title(&req.title)?;
    validate_slug(&req.slug)?;

    let now = Utc::now();
    let section = Section {
        id: Uuid::new_v4().to_string(),
        title: req.title,
        slug: req.slug,
        description: req.description,
        position: req.position,
        published: req.published,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .create_section(&section)
        .or_conflict("Section slug already exists", "Failed to create section")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(section))))
}

pub async fn list_sections(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let sections = state
        .store
        .list_sections(false)
        .api_err("Failed to list sections")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(sections)))
}

pub async fn get_section(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let section = state
        .store
        .get_section(&id)
        .api_err("Failed to get section")?
        .or_not_found("Section not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(section)))
}

pub async fn update_section(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSectionRequest>,
) -> impl IntoResponse {
    let mut section = state
        .store
        .get_section(&id)
        .api_err("Failed to get section")?
        .or_not_found("Section not found")?;

    if let Some(title) = req.title {
        validate_title(&title)?;
        section.title = title;
    }
    if let Some(slug) = req.slug {
        validate_slug(&slug)?;
        section.slug = slug;
    }
    if let Some(description) = req.description {
        section.description = description;
    }
    if let Some(position) = req.position {
        section.position = position;
    }
    if let Some(published) = req.published {
        section.published = published;
    }
    section.updated_at = Utc::now();

    state
        .store
        .update_section(&section)
        .or_conflict("Section slug already exists", "Failed to update section")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(section)))
}

pub async fn delete_section(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_section(&id)
        .api_err("Failed to delete section")?;

    if !deleted {
        return Err(ApiError::not_found("Section not found"));
    }

    tracing::info!(section_id = %id, "Section deleted with its grimoires");

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
