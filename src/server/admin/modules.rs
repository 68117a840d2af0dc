use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireAdmin;
use crate::reading;
use crate::server::AppState;
use crate::server::dto::{CreateModuleRequest, ListModulesParams, UpdateModuleRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_title;
use crate::types::CourseModule;

pub async fn create_module(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateModuleRequest>,
) -> impl IntoResponse {
    validate_title(&req.title)?;

    state
        .store
        .get_course(&req.course_id)
        .api_err("Failed to get course")?
        .ok_or_else(|| ApiError::bad_request("Course does not exist"))?;

    let (word_count, reading_minutes) = reading::estimate(&req.content, state.words_per_minute);
    let now = Utc::now();
    let module = CourseModule {
        id: Uuid::new_v4().to_string(),
        course_id: req.course_id,
        title: req.title,
        content: req.content,
        unlock_order: req.unlock_order,
        published: req.published,
        word_count,
        reading_minutes,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .create_module(&module)
        .api_err("Failed to create module")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(module))))
}

/// Lists every module of a course in unlock order, drafts included.
pub async fn list_modules(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListModulesParams>,
) -> impl IntoResponse {
    state
        .store
        .get_course(&params.course_id)
        .api_err("Failed to get course")?
        .or_not_found("Course not found")?;

    let modules = state
        .store
        .list_course_modules(&params.course_id, false)
        .api_err("Failed to list modules")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(modules)))
}

pub async fn get_module(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let module = state
        .store
        .get_module(&id)
        .api_err("Failed to get module")?
        .or_not_found("Module not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(module)))
}

pub async fn update_module(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateModuleRequest>,
) -> impl IntoResponse {
    let mut module = state
        .store
        .get_module(&id)
        .api_err("Failed to get module")?
        .or_not_found("Module not found")?;

    if let Some(title) = req.title {
        validate_title(&title)?;
        module.title = title;
    }
    if let Some(content) = req.content {
        let (words, minutes) = reading::estimate(&content, state.words_per_minute);
        module.content = content;
        module.word_count = words;
        module.reading_minutes = minutes;
    }
    if let Some(unlock_order) = req.unlock_order {
        module.unlock_order = unlock_order;
    }
    if let Some(published) = req.published {
        module.published = published;
    }
    module.updated_at = Utc::now();

    state
        .store
        .update_module(&module)
        .api_err("Failed to update module")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(module)))
}

pub async fn delete_module(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_module(&id)
        .api_err("Failed to delete module")?;

    if !deleted {
        return Err(ApiError::not_found("Module not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
