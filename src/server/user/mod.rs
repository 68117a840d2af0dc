pub mod access;
mod courses;
mod progress;
mod sections;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
};

use crate::server::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(progress::get_me))
        // Sections and grimoires
        .route("/sections", get(sections::list_sections))
        .route(
            "/sections/{slug}/grimoires",
            get(sections::list_section_grimoires),
        )
        .route("/grimoires/{slug}", get(sections::get_grimoire))
        // Courses and modules
        .route("/courses", get(courses::list_courses))
        .route("/courses/{slug}/modules", get(courses::list_course_modules))
        .route("/modules/{id}", get(courses::get_module))
        // Reading progress
        .route("/progress", get(progress::list_progress))
        .route("/progress/{item_id}", put(progress::update_progress))
}
