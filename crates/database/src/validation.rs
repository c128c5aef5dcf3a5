//! Input validation for submitted fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Empty(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Invalid email format.
    InvalidEmail(String),
    /// Numeric value outside the accepted range.
    OutOfRange { field: String, min: i64, max: i64, actual: i64 },
    /// Value not in the accepted set.
    Invalid { field: String, reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "{} is required", field),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::OutOfRange {
                field,
                min,
                max,
                actual,
            } => write!(f, "{} must be between {} and {} (got {})", field, min, max, actual),
            ValidationError::Invalid { field, reason } => write!(f, "Invalid {}: {}", field, reason),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum allowed length for names, categories and subjects.
pub const MAX_SHORT_TEXT_LENGTH: usize = 255;

/// Maximum allowed length for descriptions, comments and replies.
pub const MAX_LONG_TEXT_LENGTH: usize = 10_000;

/// Maximum allowed length for a system config key.
pub const MAX_CONFIG_KEY_LENGTH: usize = 64;

/// Require a non-blank value no longer than `max` characters.
///
/// Returns the trimmed value.
pub fn require_text<'a>(field: &str, value: &'a str, max: usize) -> Result<&'a str, ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual: len,
        });
    }

    Ok(value)
}

/// Validate an optional value's length; blank values become `None`.
pub fn optional_text<'a>(
    field: &str,
    value: Option<&'a str>,
    max: usize,
) -> Result<Option<&'a str>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => require_text(field, v, max).map(Some),
    }
}

/// Validate an email address (basic RFC 5322 format check).
///
/// This is a basic validation that checks:
/// - Contains exactly one @
/// - Has at least one character on each side of the @
/// - Has at least one dot after @
/// - Is not too long
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }

    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    if domain.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing domain (after @)".to_string(),
        ));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must contain an inner dot".to_string(),
        ));
    }

    if domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "domain cannot contain consecutive dots".to_string(),
        ));
    }

    Ok(())
}

/// Validate a feedback rating (1 to 5 inclusive).
pub fn validate_rating(rating: i64) -> Result<(), ValidationError> {
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: 1,
            max: 5,
            actual: rating,
        });
    }
    Ok(())
}

/// Validate a positive row id supplied by a client.
pub fn validate_id(field: &str, id: i64) -> Result<(), ValidationError> {
    if id <= 0 {
        return Err(ValidationError::Invalid {
            field: field.to_string(),
            reason: "must be a positive integer".to_string(),
        });
    }
    Ok(())
}
