//! HTTP endpoint handlers, one module per resource.

pub mod appointments;
pub mod auth;
pub mod caregivers;
pub mod health;
pub mod invites;
pub mod medications;
pub mod notes;
pub mod patients;
pub mod profiles;
pub mod push;
pub mod treatments;

use uuid::Uuid;

use crate::api::error::ApiError;

/// Parse a UUID path segment, rejecting malformed input at the boundary.
pub(crate) fn parse_uuid_param(name: &str, value: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value).map_err(|_| ApiError::Validation(format!("Invalid {name}")))
}

/// Reject empty or whitespace-only required fields.
pub(crate) fn require_field(name: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{name} is required")));
    }
    Ok(())
}
