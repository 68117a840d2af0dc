//! Bearer tokens of the form `templo_<lookup>_<secret>`.
//!
//! The lookup segment is stored in clear and indexes the token row. The
//! whole raw token is hashed with Argon2id and only the PHC hash is kept.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use rand::{Rng, distributions::Alphanumeric};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::Token;

const TOKEN_PREFIX: &str = "templo_";
const LOOKUP_LEN: usize = 10;
const SECRET_LEN: usize = 32;
const MAX_ISSUE_ATTEMPTS: usize = 3;

/// A freshly generated token. `raw` is shown to its owner once.
pub struct GeneratedToken {
    pub raw: String,
    pub lookup: String,
    pub hash: String,
}

/// The two segments of a well-formed raw token.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedToken<'a> {
    pub lookup: &'a str,
    pub secret: &'a str,
}

pub struct TokenHasher {
    argon2: Argon2<'static>,
}

impl Default for TokenHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenHasher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::DEFAULT),
        }
    }

    pub fn generate(&self) -> Result<GeneratedToken> {
        let lookup = random_segment(LOOKUP_LEN);
        let raw = format!("{TOKEN_PREFIX}{lookup}_{}", random_segment(SECRET_LEN));
        let hash = self.hash(&raw)?;
        Ok(GeneratedToken { raw, lookup, hash })
    }

    pub fn hash(&self, raw: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(raw.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| Error::Hashing(e.to_string()))
    }

    /// Returns `Ok(false)` on a mismatch and `Err` only for a corrupt stored hash.
    pub fn verify(&self, raw: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| Error::Hashing(e.to_string()))?;

        match self.argon2.verify_password(raw.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Hashing(e.to_string())),
        }
    }
}

fn random_segment(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn is_segment(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_alphanumeric())
}

pub fn parse_token(raw: &str) -> Result<ParsedToken<'_>> {
    let (lookup, secret) = raw
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|rest| rest.split_once('_'))
        .ok_or(Error::InvalidTokenFormat)?;

    if !is_segment(lookup, LOOKUP_LEN) || !is_segment(secret, SECRET_LEN) {
        return Err(Error::InvalidTokenFormat);
    }

    Ok(ParsedToken { lookup, secret })
}

/// Creates and stores a token for a user, regenerating on lookup collisions.
/// Returns the stored row and the raw token.
pub fn issue_token(
    store: &dyn Store,
    hasher: &TokenHasher,
    user_id: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<(Token, String)> {
    for attempt in 1..=MAX_ISSUE_ATTEMPTS {
        let generated = hasher.generate()?;
        let token = Token {
            id: Uuid::new_v4().to_string(),
            token_hash: generated.hash,
            token_lookup: generated.lookup,
            user_id: user_id.to_string(),
            created_at: Utc::now(),
            expires_at,
            last_used_at: None,
        };

        match store.create_token(&token) {
            Ok(()) => return Ok((token, generated.raw)),
            Err(Error::TokenLookupCollision) => {
                tracing::debug!(attempt, "Token lookup collision");
            }
            Err(e) => return Err(e),
        }
    }

    Err(Error::TokenLookupCollision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_parses_back() {
        let hasher = TokenHasher::new();
        let generated = hasher.generate().unwrap();

        let parsed = parse_token(&generated.raw).unwrap();
        assert_eq!(parsed.lookup, generated.lookup);
        assert_eq!(parsed.lookup.len(), 10);
        assert_eq!(parsed.secret.len(), SECRET_LEN);
        assert_eq!(generated.raw.len(), "templo_".len() + 10 + 1 + SECRET_LEN);
        assert!(generated.hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_verify_rejects_altered_secret() {
        let hasher = TokenHasher::new();
        let generated = hasher.generate().unwrap();

        assert!(hasher.verify(&generated.raw, &generated.hash).unwrap());

        let mut altered = generated.raw.clone();
        let last = if altered.ends_with('a') { 'b' } else { 'a' };
        altered.pop();
        altered.push(last);
        assert!(!hasher.verify(&altered, &generated.hash).unwrap());
    }

    #[test]
    fn test_verify_corrupt_hash_is_error() {
        let hasher = TokenHasher::new();
        assert!(matches!(
            hasher.verify("templo_x_y", "not-a-phc-string"),
            Err(Error::Hashing(_))
        ));
    }

    #[test]
    fn test_parse_token_rejects_malformed() {
        let secret = "a".repeat(SECRET_LEN);
        for raw in [
            format!("other_abcdefghij_{secret}"),
            "templo_abcdefghij".to_string(),
            format!("templo_short_{secret}"),
            format!("templo_abcdefghij_{secret}_extra"),
            format!("templo_abc-efghij_{secret}"),
        ] {
            assert!(parse_token(&raw).is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn test_issue_token_stores_verifiable_hash() {
        use crate::store::SqliteStore;
        use crate::types::{Role, User};

        let temp = tempfile::TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
            .create_user(&User {
                id: "u1".to_string(),
                email: "u1@example.com".to_string(),
                display_name: None,
                role: Role::Initiate,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .unwrap();

        let hasher = TokenHasher::new();
        let (token, raw) = issue_token(&store, &hasher, "u1", None).unwrap();

        let parsed = parse_token(&raw).unwrap();
        let stored = store.get_token_by_lookup(parsed.lookup).unwrap().unwrap();
        assert_eq!(stored.id, token.id);
        assert_eq!(stored.user_id, "u1");
        assert!(hasher.verify(&raw, &stored.token_hash).unwrap());
    }
}
