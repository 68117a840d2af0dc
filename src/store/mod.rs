mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn list_users(&self, cursor: &str, limit: i32) -> Result<Vec<User>>;
    fn update_user(&self, user: &User) -> Result<()>;
    fn delete_user(&self, id: &str) -> Result<bool>;
    fn has_admin_user(&self) -> Result<bool>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn list_user_tokens(&self, user_id: &str) -> Result<Vec<Token>>;
    fn delete_token(&self, id: &str) -> Result<bool>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;

    // Section operations
    fn create_section(&self, section: &Section) -> Result<()>;
    fn get_section(&self, id: &str) -> Result<Option<Section>>;
    fn get_section_by_slug(&self, slug: &str) -> Result<Option<Section>>;
    fn list_sections(&self, published_only: bool) -> Result<Vec<Section>>;
    fn update_section(&self, section: &Section) -> Result<()>;
    /// Deletes the section, its grimoires, and any progress or purchases pointing at them.
    fn delete_section(&self, id: &str) -> Result<bool>;

    // Grimoire operations
    fn create_grimoire(&self, grimoire: &Grimoire) -> Result<()>;
    fn get_grimoire(&self, id: &str) -> Result<Option<Grimoire>>;
    fn get_grimoire_by_slug(&self, slug: &str) -> Result<Option<Grimoire>>;
    fn list_grimoires(
        &self,
        section_id: Option<&str>,
        cursor: &str,
        limit: i32,
    ) -> Result<Vec<Grimoire>>;
    /// Grimoires of one section ordered by `(unlock_order, id)`.
    fn list_section_grimoires(&self, section_id: &str, published_only: bool)
    -> Result<Vec<Grimoire>>;
    fn update_grimoire(&self, grimoire: &Grimoire) -> Result<()>;
    fn delete_grimoire(&self, id: &str) -> Result<bool>;

    // Course operations
    fn create_course(&self, course: &Course) -> Result<()>;
    fn get_course(&self, id: &str) -> Result<Option<Course>>;
    fn get_course_by_slug(&self, slug: &str) -> Result<Option<Course>>;
    fn list_courses(&self, published_only: bool) -> Result<Vec<Course>>;
    fn update_course(&self, course: &Course) -> Result<()>;
    /// Deletes the course, its modules, and any progress or purchases pointing at them.
    fn delete_course(&self, id: &str) -> Result<bool>;

    // Course module operations
    fn create_module(&self, module: &CourseModule) -> Result<()>;
    fn get_module(&self, id: &str) -> Result<Option<CourseModule>>;
    /// Modules of one course ordered by `(unlock_order, id)`.
    fn list_course_modules(&self, course_id: &str, published_only: bool)
    -> Result<Vec<CourseModule>>;
    fn update_module(&self, module: &CourseModule) -> Result<()>;
    fn delete_module(&self, id: &str) -> Result<bool>;

    // Progress operations
    /// Stores progress, never lowering an existing percentage. Returns the stored row.
    fn record_progress(&self, progress: &Progress) -> Result<Progress>;
    fn list_user_progress(&self, user_id: &str) -> Result<Vec<Progress>>;

    // Purchase operations
    fn create_purchase(&self, purchase: &Purchase) -> Result<()>;
    fn list_user_purchases(&self, user_id: &str) -> Result<Vec<Purchase>>;
    fn delete_purchase(&self, user_id: &str, item_id: &str) -> Result<bool>;
}
