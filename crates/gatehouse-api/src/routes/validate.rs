//! Input validation shared by the route handlers

use crate::error::ApiError;

/// Maximum allowed email length
pub const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum allowed name length
pub const MAX_NAME_LENGTH: usize = 128;
/// Maximum allowed password length (prevent DoS with very large passwords)
pub const MAX_PASSWORD_LENGTH: usize = 256;
/// Maximum allowed phone length
pub const MAX_PHONE_LENGTH: usize = 32;
/// Maximum allowed cache key length
pub const MAX_CACHE_KEY_LENGTH: usize = 512;

fn within_limit(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.len() > max {
        return Err(ApiError::BadRequest(format!(
            "{} exceeds maximum length of {} bytes",
            field, max
        )));
    }
    Ok(())
}

/// Free text shown to people: blank is the same as empty
fn text(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{} cannot be empty", field)));
    }
    within_limit(field, value, max)
}

/// Opaque value passed through untouched: only the empty string is missing
fn opaque(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{} cannot be empty", field)));
    }
    within_limit(field, value, max)
}

/// Validate email format and length
pub fn email(value: &str) -> Result<(), ApiError> {
    text("Email", value, MAX_EMAIL_LENGTH)?;
    if !value.contains('@') {
        return Err(ApiError::BadRequest("Email must contain '@'".to_string()));
    }
    Ok(())
}

pub fn name(value: &str) -> Result<(), ApiError> {
    text("Name", value, MAX_NAME_LENGTH)
}

pub fn password(value: &str) -> Result<(), ApiError> {
    opaque("Password", value, MAX_PASSWORD_LENGTH)
}

pub fn phone(value: Option<&str>) -> Result<(), ApiError> {
    match value {
        Some(p) => text("Phone", p, MAX_PHONE_LENGTH),
        None => Ok(()),
    }
}

pub fn cache_key(value: &str) -> Result<(), ApiError> {
    opaque("Key", value, MAX_CACHE_KEY_LENGTH)
}
