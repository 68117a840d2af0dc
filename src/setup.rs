//! First-run bootstrap: the initial supreme-magus account and its token.

use chrono::Utc;
use uuid::Uuid;

use crate::auth::{TokenHasher, issue_token};
use crate::error::{Error, Result};
use crate::server::validation::normalize_email;
use crate::store::Store;
use crate::types::{Role, User};

/// Creates the first admin user and issues a non-expiring token for it.
///
/// Returns the user and the raw token, which is never stored in plaintext.
/// Fails with [`Error::Conflict`] once any admin exists.
pub fn initialize_admin(store: &dyn Store, email: &str) -> Result<(User, String)> {
    if store.has_admin_user()? {
        return Err(Error::Conflict("an admin user already exists".to_string()));
    }

    let email = normalize_email(email).map_err(Error::BadRequest)?;
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        display_name: None,
        role: Role::ADMIN,
        created_at: now,
        updated_at: now,
    };
    store.create_user(&user)?;

    let (_, raw_token) = issue_token(store, &TokenHasher::new(), &user.id, None)?;

    tracing::info!(user_id = %user.id, "Admin user initialized");

    Ok((user, raw_token))
}
