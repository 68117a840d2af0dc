mod helpers;
mod middleware;
mod token;

pub use middleware::{AuthError, OptionalAuth, RequireAdmin, RequireAuth};
pub use token::{GeneratedToken, ParsedToken, TokenHasher, issue_token, parse_token};
