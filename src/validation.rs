//! Input validation for raw ticket records.

use crate::error::{GroomError, Result};

/// Maximum allowed length for an item ID.
pub const MAX_ID_LENGTH: usize = 50;

/// Maximum allowed length for a ticket description.
pub const MAX_DESCRIPTION_LENGTH: usize = 50_000;

/// Characters forbidden in IDs. Sinks use ids in file names.
const FORBIDDEN_ID_CHARS: &[char] = &['/', '\\', '\0'];

fn malformed(record: &str, reason: impl Into<String>) -> GroomError {
    GroomError::MalformedInput {
        record: record.to_string(),
        reason: reason.into(),
    }
}

/// Validates an item ID.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(malformed(id, "ID cannot be empty"));
    }
    if id.chars().count() > MAX_ID_LENGTH {
        return Err(malformed(
            id,
            format!("ID exceeds maximum length of {} characters", MAX_ID_LENGTH),
        ));
    }
    if id.contains("..") {
        return Err(malformed(id, "ID cannot contain '..'"));
    }
    for c in FORBIDDEN_ID_CHARS {
        if id.contains(*c) {
            return Err(malformed(id, format!("ID cannot contain '{}'", c.escape_default())));
        }
    }
    Ok(())
}

/// Validates that a record has something to classify.
pub fn validate_content(record: &str, title: &str, description: &str) -> Result<()> {
    if title.is_empty() && description.is_empty() {
        return Err(malformed(record, "title and description are both empty"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(malformed(
            record,
            format!(
                "description exceeds maximum length of {} characters",
                MAX_DESCRIPTION_LENGTH
            ),
        ));
    }
    Ok(())
}
