//! Domain models for the medical records system.

mod doctor;
mod patient;
mod prescription;
mod role;
mod user;

pub use doctor::*;
pub use lab_test::*;
pub use patient::*;
pub use prescription::*;
pub use role::*;
pub use user::*;

use thiserror::Error;

/// Rejected request payload.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct ValidationError(pub String);

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError(format!("{field} must not be blank")));
    }
    Ok(())
}

/// Parse an ISO `YYYY-MM-DD` date.
pub(crate) fn parse_date(field: &str, value: &str) -> Result<chrono::NaiveDate, ValidationError> {
    chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError(format!("{field} must be a YYYY-MM-DD date")))
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
