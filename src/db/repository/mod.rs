//! Repository layer — entity-scoped database operations.
//!
//! Free functions over `&Connection`, split into one sub-module per
//! entity and re-exported here. Clinical-entity lookups are always
//! scoped by `patient_profile_id` so a row belonging to another
//! profile behaves exactly like a missing row.

mod appointment;
mod invite;
mod medication;
mod note;
mod permission;
mod profile;
mod push_subscription;
mod session;
mod treatment;
mod user;

pub use appointment::*;
pub use invite::*;
pub use medication::*;
pub use note::*;
pub use permission::*;
pub use profile::*;
pub use push_subscription::*;
pub use session::*;
pub use treatment::*;
pub use user::*;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use uuid::Uuid;

/// Parse a stored UUID column inside a row-mapping closure.
pub(crate) fn uuid_column(idx: usize, value: String) -> Result<Uuid, rusqlite::Error> {
    Uuid::parse_str(&value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse a stored enum column (via `FromStr`) inside a row-mapping closure.
pub(crate) fn enum_column<T: FromStr>(idx: usize, value: String) -> Result<T, rusqlite::Error>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(&value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Convert a Unix-seconds column back into an instant. Instants that
/// participate in SQL comparisons (expiry, scheduling) are stored as
/// INTEGER seconds; everything else round-trips as RFC 3339 text.
pub(crate) fn instant_column(idx: usize, secs: i64) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp out of range: {secs}").into(),
        )
    })
}
