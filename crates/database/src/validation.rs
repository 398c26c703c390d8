//! Input validation for account and analysis fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Value too short.
    TooShort { field: String, min: usize, actual: usize },
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
    /// Unsupported HTTP method.
    InvalidMethod(String),
    /// Malformed URL.
    InvalidUrl(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TooShort { field, min, actual } => {
                write!(f, "{} is too short ({} chars, min {})", field, actual, min)
            }
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::InvalidMethod(method) => {
                write!(f, "Unsupported method: {} (expected GET, POST, PUT, PATCH or DELETE)", method)
            }
            ValidationError::InvalidUrl(msg) => write!(f, "Invalid endpoint: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Minimum allowed length for a full name.
pub const MIN_FULLNAME_LENGTH: usize = 2;

/// Maximum allowed length for a full name.
pub const MAX_FULLNAME_LENGTH: usize = 50;

/// Maximum allowed length for an avatar URL.
pub const MAX_AVATAR_LENGTH: usize = 2048;

/// Methods an analysis may use.
pub const HTTP_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Validate a full name (trimmed, 2 to 50 characters).
pub fn validate_fullname(fullname: &str) -> Result<(), ValidationError> {
    let fullname = fullname.trim();
    let len = fullname.chars().count();

    if len == 0 {
        return Err(ValidationError::Empty("fullname".to_string()));
    }

    if len < MIN_FULLNAME_LENGTH {
        return Err(ValidationError::TooShort {
            field: "fullname".to_string(),
            min: MIN_FULLNAME_LENGTH,
            actual: len,
        });
    }

    if len > MAX_FULLNAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "fullname".to_string(),
            max: MAX_FULLNAME_LENGTH,
            actual: len,
        });
    }

    Ok(())
}

/// Validate an avatar URL.
pub fn validate_avatar(avatar: &str) -> Result<(), ValidationError> {
    let avatar = avatar.trim();

    if avatar.is_empty() {
        return Err(ValidationError::Empty("avatar".to_string()));
    }

    if avatar.len() > MAX_AVATAR_LENGTH {
        return Err(ValidationError::TooLong {
            field: "avatar".to_string(),
            max: MAX_AVATAR_LENGTH,
            actual: avatar.len(),
        });
    }

    Ok(())
}

/// Validate an HTTP method and return its canonical uppercase form.
pub fn validate_method(method: &str) -> Result<&'static str, ValidationError> {
    let upper = method.trim().to_uppercase();

    HTTP_METHODS
        .iter()
        .copied()
        .find(|m| *m == upper)
        .ok_or_else(|| ValidationError::InvalidMethod(method.to_string()))
}

/// Validate an outbound endpoint (absolute http or https URL).
pub fn validate_endpoint(endpoint: &str) -> Result<(), ValidationError> {
    let endpoint = endpoint.trim();

    if endpoint.is_empty() {
        return Err(ValidationError::Empty("endpoint".to_string()));
    }

    let rest = endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"))
        .ok_or_else(|| ValidationError::InvalidUrl("must start with http:// or https://".to_string()))?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(ValidationError::InvalidUrl("missing host".to_string()));
    }

    Ok(())
}
