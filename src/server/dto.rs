use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{Course, Grimoire, Role};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserTokenRequest {
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CreateTokenResponse {
    pub token: String,
    pub metadata: TokenResponse,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSectionRequest {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSectionRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGrimoireRequest {
    pub section_id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub required_role: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub unlock_order: i32,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateGrimoireRequest {
    #[serde(default)]
    pub section_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub excerpt: Option<Option<String>>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub required_role: Option<String>,
    #[serde(default)]
    pub is_paid: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub price_cents: Option<Option<i64>>,
    #[serde(default)]
    pub unlock_order: Option<i32>,
    #[serde(default)]
    pub published: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListGrimoiresParams {
    #[serde(default)]
    pub section_id: Option<String>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required_role: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCourseRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub required_role: Option<String>,
    #[serde(default)]
    pub is_paid: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub price_cents: Option<Option<i64>>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateModuleRequest {
    pub course_id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub unlock_order: i32,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateModuleRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub unlock_order: Option<i32>,
    #[serde(default)]
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListModulesParams {
    pub course_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    pub item_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProgressRequest {
    pub percentage: f64,
}

/// A grimoire as listed to a reader: metadata plus gating state, no body.
#[derive(Debug, Serialize)]
pub struct GrimoireSummary {
    pub id: String,
    pub section_id: String,
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub required_role: Role,
    pub is_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    pub unlock_order: i32,
    pub word_count: i64,
    pub reading_minutes: i64,
    pub unlocked: bool,
    pub accessible: bool,
    pub progress: f64,
}

impl GrimoireSummary {
    #[must_use]
    pub fn new(g: Grimoire, unlocked: bool, accessible: bool, progress: f64) -> Self {
        Self {
            id: g.id,
            section_id: g.section_id,
            title: g.title,
            slug: g.slug,
            excerpt: g.excerpt,
            required_role: g.required_role,
            is_paid: g.is_paid,
            price_cents: g.price_cents,
            unlock_order: g.unlock_order,
            word_count: g.word_count,
            reading_minutes: g.reading_minutes,
            unlocked,
            accessible,
            progress,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModuleSummary {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub unlock_order: i32,
    pub word_count: i64,
    pub reading_minutes: i64,
    pub unlocked: bool,
    pub progress: f64,
}

#[derive(Debug, Serialize)]
pub struct CourseWithAccess {
    #[serde(flatten)]
    pub course: Course,
    pub accessible: bool,
}
