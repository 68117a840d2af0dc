mod models;
mod role;

pub use models::*;
pub use role::{Role, has_access, has_access_by_name};
