use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::ServiceError;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Parses a non-nil UUID and returns its canonical form.
pub fn parse_id(id: &str) -> Result<String, ServiceError> {
    match Uuid::parse_str(id.trim()) {
        Ok(uuid) if !uuid.is_nil() => Ok(uuid.to_string()),
        _ => Err(ServiceError::InvalidArgument(format!("Invalid ID: {}", id))),
    }
}

/// Id for a record being created: the supplied one when present, a fresh
/// one when blank.
pub fn assign_id(supplied: &str) -> Result<String, ServiceError> {
    if supplied.trim().is_empty() {
        return Ok(new_id());
    }
    parse_id(supplied)
}

pub fn is_valid_id(id: &str) -> bool {
    parse_id(id).is_ok()
}

/// A body id, when present, must name the same record as the path id.
pub fn ensure_same_id(path_id: &str, body_id: &str) -> Result<(), ServiceError> {
    if body_id.trim().is_empty() {
        return Ok(());
    }
    match parse_id(body_id) {
        Ok(parsed) if parsed == path_id => Ok(()),
        _ => Err(ServiceError::InvalidArgument("ID mismatch".to_string())),
    }
}

pub fn ensure_percentage(field: &str, value: Decimal) -> Result<(), ServiceError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ServiceError::InvalidArgument(format!(
            "{} must be between 0 and 100",
            field
        )));
    }
    Ok(())
}

pub fn invalid(message: impl Into<String>) -> ServiceError {
    ServiceError::InvalidArgument(message.into())
}
