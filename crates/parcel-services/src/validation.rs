//! Input validation for property operations.
//!
//! Validation never stops at the first problem: every violated rule is
//! reported so callers can fix all fields in one round trip.

use serde::Serialize;

use crate::error::PropertyError;
use crate::property::NewProperty;

pub const RULE_REQUIRED: &str = "required";
pub const RULE_FORMAT: &str = "format";

/// One violated rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub rule: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check all four fields of a creation request.
pub fn validate_new_property(input: &NewProperty) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if input.street.trim().is_empty() {
        violations.push(FieldViolation::new("street", RULE_REQUIRED, "Street is required"));
    }

    if input.city.trim().is_empty() {
        violations.push(FieldViolation::new("city", RULE_REQUIRED, "City is required"));
    }

    if input.state.is_empty() {
        violations.push(FieldViolation::new("state", RULE_REQUIRED, "State is required"));
    } else if !is_state_code(&input.state) {
        violations.push(FieldViolation::new(
            "state",
            RULE_FORMAT,
            "State must be exactly 2 uppercase letters (e.g. AZ)",
        ));
    }

    if input.zip_code.is_empty() {
        violations.push(FieldViolation::new("zipCode", RULE_REQUIRED, "Zip code is required"));
    } else if !is_zip_code(&input.zip_code) {
        violations.push(FieldViolation::new(
            "zipCode",
            RULE_FORMAT,
            "Zip code must be exactly 5 digits",
        ));
    }

    violations
}

/// Reject blank identifiers before they reach the store.
///
/// # Errors
/// Returns `PropertyError::ValidationFailed` if `id` is empty or whitespace.
pub fn validate_id(id: &str) -> Result<&str, PropertyError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(PropertyError::ValidationFailed(vec![FieldViolation::new(
            "id",
            RULE_REQUIRED,
            "Property ID is required",
        )]));
    }
    Ok(trimmed)
}

fn is_state_code(value: &str) -> bool {
    value.len() == 2 && value.bytes().all(|b| b.is_ascii_uppercase())
}

fn is_zip_code(value: &str) -> bool {
    value.len() == 5 && value.bytes().all(|b| b.is_ascii_digit())
}
