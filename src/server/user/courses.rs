use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::auth::OptionalAuth;
use crate::server::AppState;
use crate::server::dto::{CourseWithAccess, ModuleSummary};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};

use super::access::{
    ReaderContext, course_accessible, course_modules, require_course_access,
    require_module_access,
};

pub async fn list_courses(
    auth: OptionalAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let ctx = ReaderContext::load(store, auth.user.as_ref())?;

    let courses = store
        .list_courses(!ctx.is_admin())
        .api_err("Failed to list courses")?;

    let courses: Vec<CourseWithAccess> = courses
        .into_iter()
        .map(|course| CourseWithAccess {
            accessible: course_accessible(&ctx, &course),
            course,
        })
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(courses)))
}

pub async fn list_course_modules(
    auth: OptionalAuth,
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let ctx = ReaderContext::load(store, auth.user.as_ref())?;

    let course = store
        .get_course_by_slug(&slug)
        .api_err("Failed to get course")?
        .filter(|c| c.published || ctx.is_admin())
        .or_not_found("Course not found")?;

    require_course_access(&ctx, &course)?;

    let (modules, unlocked) = course_modules(&state, &ctx, &course.id)?;

    let summaries: Vec<ModuleSummary> = modules
        .into_iter()
        .map(|m| ModuleSummary {
            unlocked: unlocked.contains(&m.id),
            progress: ctx.progress_of(&m.id),
            id: m.id,
            course_id: m.course_id,
            title: m.title,
            unlock_order: m.unlock_order,
            word_count: m.word_count,
            reading_minutes: m.reading_minutes,
        })
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(summaries)))
}

pub async fn get_module(
    auth: OptionalAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let ctx = ReaderContext::load(store, auth.user.as_ref())?;

    let module = store
        .get_module(&id)
        .api_err("Failed to get module")?
        .or_not_found("Module not found")?;

    require_module_access(&state, &ctx, &module)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(module)))
}
