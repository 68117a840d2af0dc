use crate::server::response::ApiError;
use crate::types::Role;

const MAX_SLUG_LEN: usize = 100;
const MAX_TITLE_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 254;

fn is_valid_slug_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
}

pub fn validate_slug(slug: &str) -> Result<(), ApiError> {
    if slug.is_empty() {
        return Err(ApiError::bad_request("Slug cannot be empty"));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(ApiError::bad_request(format!(
            "Slug cannot exceed {MAX_SLUG_LEN} characters"
        )));
    }
    if !slug.chars().all(is_valid_slug_char) {
        return Err(ApiError::bad_request(
            "Slug can only contain lowercase letters, digits, and hyphens",
        ));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(ApiError::bad_request(
            "Slug cannot start or end with a hyphen",
        ));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::bad_request("Title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::bad_request(format!(
            "Title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Lower-cases and checks the rough shape of an email address.
pub fn normalize_email(email: &str) -> Result<String, String> {
    let email = email.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LEN {
        return Err("Email is too long".to_string());
    }
    let valid = matches!(
        email.split_once('@'),
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@')
    );
    if !valid || email.contains(char::is_whitespace) {
        return Err("Invalid email address".to_string());
    }
    Ok(email)
}

/// Parses a role name from a request body. Unknown names are a 400, never a silent default.
pub fn parse_role(name: &str) -> Result<Role, ApiError> {
    Role::parse(name).map_err(|e| ApiError::bad_request(e.to_string()))
}

pub fn validate_percentage(percentage: f64) -> Result<(), ApiError> {
    if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
        return Err(ApiError::bad_request(
            "percentage must be between 0 and 100",
        ));
    }
    Ok(())
}

pub fn validate_price(price_cents: Option<i64>) -> Result<(), ApiError> {
    if matches!(price_cents, Some(p) if p < 0) {
        return Err(ApiError::bad_request("price_cents cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("liber-null").is_ok());
        assert!(validate_slug("book-7").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Liber").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("with space").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Magus@Example.COM ").unwrap(),
            "magus@example.com"
        );
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("a@b@c").is_err());
    }

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("crown-bearer").unwrap(), Role::CrownBearer);
        let err = parse_role("admin").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage(0.0).is_ok());
        assert!(validate_percentage(100.0).is_ok());
        assert!(validate_percentage(-0.5).is_err());
        assert!(validate_percentage(100.1).is_err());
        assert!(validate_percentage(f64::NAN).is_err());
    }
}
