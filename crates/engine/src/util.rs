//! Internal helpers for model validation and conversion.
//!
//! Stored values that fail to parse are reported as persistence failures;
//! caller input that fails to parse is an invalid request.

use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Amount, EngineError, ResultEngine};

/// Parse a UUID read from storage.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| EngineError::PersistenceFailure(format!("invalid stored {label} id")))
}

/// Parse a decimal read from storage.
pub(crate) fn parse_stored_decimal(value: &str, label: &str) -> ResultEngine<Decimal> {
    Decimal::from_str(value)
        .map_err(|_| EngineError::PersistenceFailure(format!("invalid stored {label}")))
}

/// Parse a transaction amount read from storage.
pub(crate) fn parse_stored_amount(value: &str) -> ResultEngine<Amount> {
    let decimal = parse_stored_decimal(value, "amount")?;
    Amount::new(decimal)
        .map_err(|_| EngineError::PersistenceFailure("negative stored amount".to_string()))
}

/// Parse a caller-supplied id.
///
/// Malformed ids are an [`EngineError::InvalidRequest`].
pub fn parse_request_id(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|_| EngineError::InvalidRequest(format!("invalid {label} id: {value}")))
}

/// Trim a required text field, rejecting empty values.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidRequest(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
