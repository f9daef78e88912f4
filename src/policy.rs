//! Account field policies.
//!
//! Pure, deterministic checks shared between the request-body validators
//! and [`crate::user::IdentityService`]. Each check reports the first
//! unmet rule.

use std::sync::LazyLock;

use regex_lite::Regex;
use validator::{ValidationError, ValidationErrors};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_NAME_LENGTH: usize = 2;

// E.164-like: optional `+`, then 2 to 15 digits, no leading zero.
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9][0-9]{1,14}$").expect("phone regex"));

/// Validate password strength.
///
/// Rules, in order: length, uppercase, lowercase, digit.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::new("password_too_short")
            .with_message("Password must contain at least 8 characters.".into()));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::new("password_missing_uppercase")
            .with_message("Password must contain an uppercase letter.".into()));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::new("password_missing_lowercase")
            .with_message("Password must contain a lowercase letter.".into()));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("password_missing_digit")
            .with_message("Password must contain a digit.".into()));
    }

    Ok(())
}

/// Validate full name: letters and whitespace only.
pub fn validate_full_name(full_name: &str) -> Result<(), ValidationError> {
    if full_name.chars().count() < MIN_NAME_LENGTH {
        return Err(ValidationError::new("name_too_short")
            .with_message("Full name must contain at least 2 characters.".into()));
    }
    if !full_name.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) {
        return Err(ValidationError::new("name_invalid_characters")
            .with_message("Full name may only contain letters and spaces.".into()));
    }

    Ok(())
}

/// Validate an optional phone number against an E.164-like pattern.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if !PHONE.is_match(phone) {
        return Err(ValidationError::new("phone_invalid")
            .with_message("Phone must be digits in international format.".into()));
    }

    Ok(())
}

/// Validate every policed field of a registration candidate at once.
pub fn validate_candidate(
    password: &str,
    full_name: &str,
    phone: Option<&str>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if let Err(issue) = validate_password(password) {
        errors.add("password", issue);
    }
    if let Err(issue) = validate_full_name(full_name) {
        errors.add("full_name", issue);
    }
    if let Some(phone) = phone
        && let Err(issue) = validate_phone(phone)
    {
        errors.add("phone", issue);
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(())
}

/// Run [`validate_password`] and report failure on the `password` field.
///
/// Used where no derive-based validation runs, e.g. admin password resets.
pub fn password_errors(password: &str) -> Result<(), ValidationErrors> {
    if let Err(issue) = validate_password(password) {
        let mut errors = ValidationErrors::new();
        errors.add("password", issue);
        return Err(errors);
    }

    Ok(())
}
