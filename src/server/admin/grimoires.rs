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
use crate::server::dto::{CreateGrimoireRequest, ListGrimoiresParams, UpdateGrimoireRequest};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
};
use crate::server::validation::{parse_role, validate_price, validate_slug, validate_title};
use crate::types::{Grimoire, Role};

fn require_section(state: &AppState, section_id: &str) -> Result<(), ApiError> {
    state
        .store
        .get_section(section_id)
        .api_err("Failed to get section")?
        .map(|_| ())
        .ok_or_else(|| ApiError::bad_request("Section does not exist"))
}

pub async fn create_grimoire(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateGrimoireRequest>,
) -> impl IntoResponse {
    validate_title(&req.title)?;
    validate_slug(&req.slug)?;
    validate_price(req.price_cents)?;
    let required_role = match req.required_role.as_deref() {
        Some(name) => parse_role(name)?,
        None => Role::default(),
    };
    require_section(&state, &req.section_id)?;

    let (word_count, reading_minutes) = reading::estimate(&req.content, state.words_per_minute);
    let now = Utc::now();
    let grimoire = Grimoire {
        id: Uuid::new_v4().to_string(),
        section_id: req.section_id,
        title: req.title,
        slug: req.slug,
        excerpt: req.excerpt,
        content: req.content,
        required_role,
        is_paid: req.is_paid,
        price_cents: req.price_cents,
        unlock_order: req.unlock_order,
        published: req.published,
        word_count,
        reading_minutes,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .create_grimoire(&grimoire)
        .or_conflict("Grimoire slug already exists", "Failed to create grimoire")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(grimoire))))
}

pub async fn list_grimoires(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListGrimoiresParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let grimoires = state
        .store
        .list_grimoires(params.section_id.as_deref(), cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list grimoires")?;

    Ok::<_, ApiError>(Json(PaginatedResponse::from_overfetch(
        grimoires,
        DEFAULT_PAGE_SIZE as usize,
        |g| g.id.clone(),
    )))
}

pub async fn get_grimoire(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let grimoire = state
        .store
        .get_grimoire(&id)
        .api_err("Failed to get grimoire")?
        .or_not_found("Grimoire not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(grimoire)))
}

pub async fn update_grimoire(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateGrimoireRequest>,
) -> impl IntoResponse {
    let mut grimoire = state
        .store
        .get_grimoire(&id)
        .api_err("Failed to get grimoire")?
        .or_not_found("Grimoire not found")?;

    if let Some(section_id) = req.section_id {
        require_section(&state, &section_id)?;
        grimoire.section_id = section_id;
    }
    if let Some(title) = req.title {
        validate_title(&title)?;
        grimoire.title = title;
    }
    if let Some(slug) = req.slug {
        validate_slug(&slug)?;
        grimoire.slug = slug;
    }
    if let Some(excerpt) = req.excerpt {
        grimoire.excerpt = excerpt;
    }
    if let Some(content) = req.content {
        let (words, minutes) = reading::estimate(&content, state.words_per_minute);
        grimoire.content = content;
        grimoire.word_count = words;
        grimoire.reading_minutes = minutes;
    }
    if let Some(name) = req.required_role.as_deref() {
        grimoire.required_role = parse_role(name)?;
    }
    if let Some(is_paid) = req.is_paid {
        grimoire.is_paid = is_paid;
    }
    if let Some(price_cents) = req.price_cents {
        validate_price(price_cents)?;
        grimoire.price_cents = price_cents;
    }
    if let Some(unlock_order) = req.unlock_order {
        grimoire.unlock_order = unlock_order;
    }
    if let Some(published) = req.published {
        grimoire.published = published;
    }
    grimoire.updated_at = Utc::now();

    state
        .store
        .update_grimoire(&grimoire)
        .or_conflict("Grimoire slug already exists", "Failed to update grimoire")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(grimoire)))
}

pub async fn delete_grimoire(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_grimoire(&id)
        .api_err("Failed to delete grimoire")?;

    if !deleted {
        return Err(ApiError::not_found("Grimoire not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
