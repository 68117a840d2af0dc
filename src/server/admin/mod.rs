mod courses;
mod grimoires;
mod modules;
mod purchases;
mod sections;
mod tokens;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // User routes
        .route("/users", post(users::create_user).get(users::list_users))
        .route(
            "/users/{id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/users/{id}/tokens",
            get(users::list_user_tokens).post(users::create_user_token),
        )
        // Token routes
        .route("/tokens/{id}", get(tokens::get_token).delete(tokens::delete_token))
        // Purchase routes
        .route(
            "/users/{id}/purchases",
            post(purchases::create_purchase).get(purchases::list_purchases),
        )
        .route(
            "/users/{id}/purchases/{item_id}",
            delete(purchases::delete_purchase),
        )
        // Section routes
        .route(
            "/sections",
            post(sections::create_section).get(sections::list_sections),
        )
        .route(
            "/sections/{id}",
            get(sections::get_section)
                .patch(sections::update_section)
                .delete(sections::delete_section),
        )
        // Grimoire routes
        .route(
            "/grimoires",
            post(grimoires::create_grimoire).get(grimoires::list_grimoires),
        )
        .route(
            "/grimoires/{id}",
            get(grimoires::get_grimoire)
                .patch(grimoires::update_grimoire)
                .delete(grimoires::delete_grimoire),
        )
        // Course routes
        .route(
            "/courses",
            post(courses::create_course).get(courses::list_courses),
        )
        .route(
            "/courses/{id}",
            get(courses::get_course)
                .patch(courses::update_course)
                .delete(courses::delete_course),
        )
        // Module routes
        .route(
            "/modules",
            post(modules::create_module).get(modules::list_modules),
        )
        .route(
            "/modules/{id}",
            get(modules::get_module)
                .patch(modules::update_module)
                .delete(modules::delete_module),
        )
}
