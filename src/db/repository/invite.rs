use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::repository::{instant_column, uuid_column};
use crate::db::DatabaseError;
use crate::models::CaregiverInvite;

fn invite_from_row(row: &Row) -> Result<CaregiverInvite, rusqlite::Error> {
    Ok(CaregiverInvite {
        id: uuid_column(0, row.get(0)?)?,
        code: row.get(1)?,
        patient_profile_id: uuid_column(2, row.get(2)?)?,
        expires_at: instant_column(3, row.get(3)?)?,
        used: row.get(4)?,
        created_at: row.get::<_, DateTime<Utc>>(5)?,
    })
}

const INVITE_COLUMNS: &str = "id, code, patient_profile_id, expires_at, used, created_at";

pub fn insert_invite(conn: &Connection, invite: &CaregiverInvite) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO caregiver_invites (id, code, patient_profile_id, expires_at, used, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            invite.id.to_string(),
            invite.code,
            invite.patient_profile_id.to_string(),
            invite.expires_at.timestamp(),
            invite.used,
            invite.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_invite_by_code(
    conn: &Connection,
    code: &str,
) -> Result<Option<CaregiverInvite>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INVITE_COLUMNS} FROM caregiver_invites WHERE code = ?1"
    ))?;
    let mut rows = stmt.query_map(params![code], invite_from_row)?;
    rows.next().transpose().map_err(DatabaseError::from)
}

/// Invites still redeemable for a profile: unused and unexpired.
pub fn list_pending_invites(
    conn: &Connection,
    patient_profile_id: &Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<CaregiverInvite>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INVITE_COLUMNS} FROM caregiver_invites
         WHERE patient_profile_id = ?1 AND used = 0 AND expires_at > ?2
         ORDER BY created_at"
    ))?;
    let rows = stmt.query_map(
        params![patient_profile_id.to_string(), now.timestamp()],
        invite_from_row,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Conditionally consume an invite: only a row that is still unused and
/// unexpired transitions. Returns `true` if this call consumed it —
/// under concurrent redemption of the same code, at most one caller
/// ever sees `true`.
pub fn mark_invite_used(
    conn: &Connection,
    id: &Uuid,
    now: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE caregiver_invites SET used = 1
         WHERE id = ?1 AND used = 0 AND expires_at > ?2",
        params![id.to_string(), now.timestamp()],
    )?;
    Ok(changed > 0)
}

/// Cancel an unused invite. Scoped to the issuing profile; returns
/// `true` if a row was removed.
pub fn delete_invite(
    conn: &Connection,
    id: &Uuid,
    patient_profile_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM caregiver_invites
         WHERE id = ?1 AND patient_profile_id = ?2 AND used = 0",
        params![id.to_string(), patient_profile_id.to_string()],
    )?;
    Ok(changed > 0)
}
