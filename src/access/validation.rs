//! Identifier validation ahead of any store call.

use regex::Regex;
use std::sync::LazyLock;

static UUID_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").ok()
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid UUID format: {0}")]
    InvalidUuid(String),
}

/// 8-4-4-4-12 hex, either case.
pub fn is_valid_uuid(value: &str) -> bool {
    UUID_PATTERN
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

pub fn validate_uuid(value: &str) -> Result<(), ValidationError> {
    if is_valid_uuid(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUuid(value.to_string()))
    }
}

/// Fails on the first value that is not a UUID.
pub fn validate_uuid_array<S: AsRef<str>>(values: &[S]) -> Result<(), ValidationError> {
    values.iter().try_for_each(|v| validate_uuid(v.as_ref()))
}
