use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::repository::{enum_column, uuid_column};
use crate::db::DatabaseError;
use crate::models::enums::PermissionLevel;
use crate::models::{CaregiverGrant, PatientAccess, Permission};

fn permission_from_row(row: &Row) -> Result<Permission, rusqlite::Error> {
    Ok(Permission {
        id: uuid_column(0, row.get(0)?)?,
        patient_profile_id: uuid_column(1, row.get(1)?)?,
        caregiver_id: uuid_column(2, row.get(2)?)?,
        level: enum_column(3, row.get(3)?)?,
        granted_at: row.get::<_, DateTime<Utc>>(4)?,
    })
}

const PERMISSION_COLUMNS: &str = "id, patient_profile_id, caregiver_id, level, granted_at";

pub fn get_permission(
    conn: &Connection,
    patient_profile_id: &Uuid,
    caregiver_id: &Uuid,
) -> Result<Option<Permission>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PERMISSION_COLUMNS} FROM permissions
         WHERE patient_profile_id = ?1 AND caregiver_id = ?2"
    ))?;
    let mut rows = stmt.query_map(
        params![patient_profile_id.to_string(), caregiver_id.to_string()],
        permission_from_row,
    )?;
    rows.next().transpose().map_err(DatabaseError::from)
}

/// Grant at `level` unless a grant already exists; an existing grant
/// keeps its current level. Returns the effective permission either way.
pub fn grant_permission_if_absent(
    conn: &Connection,
    patient_profile_id: &Uuid,
    caregiver_id: &Uuid,
    level: PermissionLevel,
    now: DateTime<Utc>,
) -> Result<Permission, DatabaseError> {
    conn.execute(
        "INSERT INTO permissions (id, patient_profile_id, caregiver_id, level, granted_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (patient_profile_id, caregiver_id) DO NOTHING",
        params![
            Uuid::new_v4().to_string(),
            patient_profile_id.to_string(),
            caregiver_id.to_string(),
            level.as_str(),
            now,
        ],
    )?;
    get_permission(conn, patient_profile_id, caregiver_id)?.ok_or_else(|| {
        DatabaseError::NotFound {
            entity_type: "permission".into(),
            id: format!("{patient_profile_id}/{caregiver_id}"),
        }
    })
}

/// Returns `true` if an existing grant was changed.
pub fn set_permission_level(
    conn: &Connection,
    patient_profile_id: &Uuid,
    caregiver_id: &Uuid,
    level: PermissionLevel,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE permissions SET level = ?1
         WHERE patient_profile_id = ?2 AND caregiver_id = ?3",
        params![
            level.as_str(),
            patient_profile_id.to_string(),
            caregiver_id.to_string(),
        ],
    )?;
    Ok(changed > 0)
}

/// Revoke a grant. Returns `true` if a row was removed.
pub fn delete_permission(
    conn: &Connection,
    patient_profile_id: &Uuid,
    caregiver_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM permissions WHERE patient_profile_id = ?1 AND caregiver_id = ?2",
        params![patient_profile_id.to_string(), caregiver_id.to_string()],
    )?;
    Ok(changed > 0)
}

/// Grants for a profile, with each caregiver's email.
pub fn list_grants_for_profile(
    conn: &Connection,
    patient_profile_id: &Uuid,
) -> Result<Vec<CaregiverGrant>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT p.caregiver_id, u.email, p.level, p.granted_at
         FROM permissions p JOIN users u ON u.id = p.caregiver_id
         WHERE p.patient_profile_id = ?1
         ORDER BY p.granted_at",
    )?;
    let rows = stmt.query_map(params![patient_profile_id.to_string()], |row| {
        Ok(CaregiverGrant {
            caregiver_id: uuid_column(0, row.get(0)?)?,
            caregiver_email: row.get(1)?,
            level: enum_column(2, row.get(2)?)?,
            granted_at: row.get::<_, DateTime<Utc>>(3)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Profiles a caregiver may access, with each patient's name.
pub fn list_patients_for_caregiver(
    conn: &Connection,
    caregiver_id: &Uuid,
) -> Result<Vec<PatientAccess>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT p.patient_profile_id, pp.full_name, p.level, p.granted_at
         FROM permissions p JOIN patient_profiles pp ON pp.id = p.patient_profile_id
         WHERE p.caregiver_id = ?1
         ORDER BY pp.full_name",
    )?;
    let rows = stmt.query_map(params![caregiver_id.to_string()], |row| {
        Ok(PatientAccess {
            patient_profile_id: uuid_column(0, row.get(0)?)?,
            patient_name: row.get(1)?,
            level: enum_column(2, row.get(2)?)?,
            granted_at: row.get::<_, DateTime<Utc>>(3)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
