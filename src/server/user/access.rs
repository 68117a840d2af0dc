//! Content gating for readers.
//!
//! A reader may open an item when its role reaches the item's required role,
//! any price has been paid, and the Unlock Gate has opened it within its
//! grouping. Admins bypass all three, and also see unpublished content.

use std::collections::{HashMap, HashSet};

use crate::server::AppState;
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::store::Store;
use crate::types::{Course, CourseModule, Grimoire, Role, User, has_access};
use crate::unlock::compute_unlocked;

/// What a reader holds that gating decisions depend on.
pub struct ReaderContext<'a> {
    pub user: Option<&'a User>,
    pub progress: HashMap<String, f64>,
    pub purchases: HashSet<String>,
}

impl<'a> ReaderContext<'a> {
    pub fn load(store: &dyn Store, user: Option<&'a User>) -> Result<Self, ApiError> {
        let Some(u) = user else {
            return Ok(Self {
                user: None,
                progress: HashMap::new(),
                purchases: HashSet::new(),
            });
        };

        let progress = store
            .list_user_progress(&u.id)
            .api_err("Failed to load progress")?
            .into_iter()
            .map(|p| (p.item_id, p.percentage))
            .collect();

        let purchases = store
            .list_user_purchases(&u.id)
            .api_err("Failed to load purchases")?
            .into_iter()
            .map(|p| p.item_id)
            .collect();

        Ok(Self {
            user,
            progress,
            purchases,
        })
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.is_some_and(User::is_admin)
    }

    #[must_use]
    pub fn role_allows(&self, required: Role) -> bool {
        self.user.is_some_and(|u| has_access(u.role, required))
    }

    #[must_use]
    pub fn owns(&self, is_paid: bool, item_id: &str) -> bool {
        !is_paid || self.is_admin() || self.purchases.contains(item_id)
    }

    #[must_use]
    pub fn progress_of(&self, item_id: &str) -> f64 {
        self.progress.get(item_id).copied().unwrap_or(0.0)
    }
}

/// Published grimoires of a section with the ids the reader has unlocked.
pub fn section_grimoires(
    state: &AppState,
    ctx: &ReaderContext<'_>,
    section_id: &str,
) -> Result<(Vec<Grimoire>, HashSet<String>), ApiError> {
    let grimoires = state
        .store
        .list_section_grimoires(section_id, !ctx.is_admin())
        .api_err("Failed to list grimoires")?;

    let unlocked = if ctx.is_admin() {
        grimoires.iter().map(|g| g.id.clone()).collect()
    } else {
        compute_unlocked(&grimoires, &ctx.progress, state.unlock_threshold)
    };

    Ok((grimoires, unlocked))
}

/// Published modules of a course with the ids the reader has unlocked.
pub fn course_modules(
    state: &AppState,
    ctx: &ReaderContext<'_>,
    course_id: &str,
) -> Result<(Vec<CourseModule>, HashSet<String>), ApiError> {
    let modules = state
        .store
        .list_course_modules(course_id, !ctx.is_admin())
        .api_err("Failed to list modules")?;

    let unlocked = if ctx.is_admin() {
        modules.iter().map(|m| m.id.clone()).collect()
    } else {
        compute_unlocked(&modules, &ctx.progress, state.unlock_threshold)
    };

    Ok((modules, unlocked))
}

/// Returns whether the reader may enter a course, ignoring module unlocking.
#[must_use]
pub fn course_accessible(ctx: &ReaderContext<'_>, course: &Course) -> bool {
    ctx.role_allows(course.required_role) && ctx.owns(course.is_paid, &course.id)
}

fn require_reader<'a>(ctx: &ReaderContext<'a>) -> Result<&'a User, ApiError> {
    ctx.user
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))
}

fn require_role(ctx: &ReaderContext<'_>, required: Role) -> Result<(), ApiError> {
    if !ctx.role_allows(required) {
        return Err(ApiError::forbidden(format!(
            "Requires the {required} role or higher"
        )));
    }
    Ok(())
}

fn require_ownership(ctx: &ReaderContext<'_>, is_paid: bool, item_id: &str) -> Result<(), ApiError> {
    if !ctx.owns(is_paid, item_id) {
        return Err(ApiError::forbidden("Purchase required"));
    }
    Ok(())
}

/// Checks that the reader may open a grimoire.
pub fn require_grimoire_access(
    state: &AppState,
    ctx: &ReaderContext<'_>,
    grimoire: &Grimoire,
) -> Result<(), ApiError> {
    let user = require_reader(ctx)?;
    if user.is_admin() {
        return Ok(());
    }

    let section = state
        .store
        .get_section(&grimoire.section_id)
        .api_err("Failed to get section")?
        .or_not_found("Grimoire not found")?;

    if !grimoire.published || !section.published {
        return Err(ApiError::not_found("Grimoire not found"));
    }

    require_role(ctx, grimoire.required_role)?;
    require_ownership(ctx, grimoire.is_paid, &grimoire.id)?;

    let (_, unlocked) = section_grimoires(state, ctx, &section.id)?;
    if !unlocked.contains(&grimoire.id) {
        tracing::debug!(user_id = %user.id, grimoire_id = %grimoire.id, "Grimoire still locked");
        return Err(ApiError::forbidden(
            "Finish the previous grimoire to unlock this one",
        ));
    }

    Ok(())
}

/// Checks that the reader may enter a course.
pub fn require_course_access(ctx: &ReaderContext<'_>, course: &Course) -> Result<(), ApiError> {
    let user = require_reader(ctx)?;
    if user.is_admin() {
        return Ok(());
    }
    if !course.published {
        return Err(ApiError::not_found("Course not found"));
    }

    require_role(ctx, course.required_role)?;
    require_ownership(ctx, course.is_paid, &course.id)
}

/// Checks that the reader may open a course module.
pub fn require_module_access(
    state: &AppState,
    ctx: &ReaderContext<'_>,
    module: &CourseModule,
) -> Result<(), ApiError> {
    let user = require_reader(ctx)?;
    if user.is_admin() {
        return Ok(());
    }

    let course = state
        .store
        .get_course(&module.course_id)
        .api_err("Failed to get course")?
        .or_not_found("Module not found")?;

    if !module.published || !course.published {
        return Err(ApiError::not_found("Module not found"));
    }

    require_course_access(ctx, &course)?;

    let (_, unlocked) = course_modules(state, ctx, &course.id)?;
    if !unlocked.contains(&module.id) {
        return Err(ApiError::forbidden(
            "Finish the previous module to unlock this one",
        ));
    }

    Ok(())
}
