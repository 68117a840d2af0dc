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
use crate::server::dto::{CreateCourseRequest, UpdateCourseRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{parse_role, validate_price, validate_slug, validate_title};
use crate::types::{Course, Role};

pub async fn create_course(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCourseRequest>,
) -> impl IntoResponse {
    validate_title(&req.title)?;
    validate_slug(&req.slug)?;
    validate_price(req.price_cents)?;
    let required_role = match req.required_role.as_deref() {
        Some(name) => parse_role(name)?,
        None => Role::default(),
    };

    let now = Utc::now();
    let course = Course {
        id: Uuid::new_v4().to_string(),
        title: req.title,
        slug: req.slug,
        description: req.description,
        required_role,
        is_paid: req.is_paid,
        price_cents: req.price_cents,
        position: req.position,
        published: req.published,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .create_course(&course)
        .or_conflict("Course slug already exists", "Failed to create course")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(course))))
}

pub async fn list_courses(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let courses = state
        .store
        .list_courses(false)
        .api_err("Failed to list courses")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(courses)))
}

pub async fn get_course(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let course = state
        .store
        .get_course(&id)
        .api_err("Failed to get course")?
        .or_not_found("Course not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(course)))
}

pub async fn update_course(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCourseRequest>,
) -> impl IntoResponse {
    let mut course = state
        .store
        .get_course(&id)
        .api_err("Failed to get course")?
        .or_not_found("Course not found")?;

    if let Some(title) = req.title {
        validate_title(&title)?;
        course.title = title;
    }
    if let Some(slug) = req.slug {
        validate_slug(&slug)?;
        course.slug = slug;
    }
    if let Some(description) = req.description {
        course.description = description;
    }
    if let Some(name) = req.required_role.as_deref() {
        course.required_role = parse_role(name)?;
    }
    if let Some(is_paid) = req.is_paid {
        course.is_paid = is_paid;
    }
    if let Some(price_cents) = req.price_cents {
        validate_price(price_cents)?;
        course.price_cents = price_cents;
    }
    if let Some(position) = req.position {
        course.position = position;
    }
    if let Some(published) = req.published {
        course.published = published;
    }
    course.updated_at = Utc::now();

    state
        .store
        .update_course(&course)
        .or_conflict("Course slug already exists", "Failed to update course")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(course)))
}

pub async fn delete_course(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_course(&id)
        .api_err("Failed to delete course")?;

    if !deleted {
        return Err(ApiError::not_found("Course not found"));
    }

    tracing::info!(course_id = %id, "Course deleted with its modules");

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
