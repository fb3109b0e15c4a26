use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::repository::uuid_column;
use crate::db::DatabaseError;
use crate::models::PatientProfile;

fn profile_from_row(row: &Row) -> Result<PatientProfile, rusqlite::Error> {
    Ok(PatientProfile {
        id: uuid_column(0, row.get(0)?)?,
        user_id: uuid_column(1, row.get(1)?)?,
        full_name: row.get(2)?,
        birth_date: row.get(3)?,
        blood_type: row.get(4)?,
        allergies: row.get(5)?,
        conditions: row.get(6)?,
        emergency_contact: row.get(7)?,
        updated_at: row.get::<_, DateTime<Utc>>(8)?,
    })
}

const PROFILE_COLUMNS: &str =
    "id, user_id, full_name, birth_date, blood_type, allergies, conditions, emergency_contact, updated_at";

pub fn insert_profile(conn: &Connection, profile: &PatientProfile) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patient_profiles
         (id, user_id, full_name, birth_date, blood_type, allergies, conditions, emergency_contact, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            profile.id.to_string(),
            profile.user_id.to_string(),
            profile.full_name,
            profile.birth_date,
            profile.blood_type,
            profile.allergies,
            profile.conditions,
            profile.emergency_contact,
            profile.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_profile(conn: &Connection, id: &Uuid) -> Result<Option<PatientProfile>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROFILE_COLUMNS} FROM patient_profiles WHERE id = ?1"
    ))?;
    let mut rows = stmt.query_map(params![id.to_string()], profile_from_row)?;
    rows.next().transpose().map_err(DatabaseError::from)
}

pub fn get_profile_by_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Option<PatientProfile>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROFILE_COLUMNS} FROM patient_profiles WHERE user_id = ?1"
    ))?;
    let mut rows = stmt.query_map(params![user_id.to_string()], profile_from_row)?;
    rows.next().transpose().map_err(DatabaseError::from)
}

pub fn profile_exists(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM patient_profiles WHERE id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn update_profile(conn: &Connection, profile: &PatientProfile) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patient_profiles
         SET full_name = ?1, birth_date = ?2, blood_type = ?3, allergies = ?4,
             conditions = ?5, emergency_contact = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            profile.full_name,
            profile.birth_date,
            profile.blood_type,
            profile.allergies,
            profile.conditions,
            profile.emergency_contact,
            profile.updated_at,
            profile.id.to_string(),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient_profile".into(),
            id: profile.id.to_string(),
        });
    }
    Ok(())
}
