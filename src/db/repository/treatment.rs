use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::repository::uuid_column;
use crate::db::DatabaseError;
use crate::models::Treatment;

fn treatment_from_row(row: &Row) -> Result<Treatment, rusqlite::Error> {
    Ok(Treatment {
        id: uuid_column(0, row.get(0)?)?,
        patient_profile_id: uuid_column(1, row.get(1)?)?,
        name: row.get(2)?,
        description: row.get(3)?,
        frequency: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        created_at: row.get::<_, DateTime<Utc>>(7)?,
        updated_at: row.get::<_, DateTime<Utc>>(8)?,
    })
}

const TREATMENT_COLUMNS: &str =
    "id, patient_profile_id, name, description, frequency, start_date, end_date, created_at, updated_at";

pub fn insert_treatment(conn: &Connection, treatment: &Treatment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO treatments
         (id, patient_profile_id, name, description, frequency, start_date, end_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            treatment.id.to_string(),
            treatment.patient_profile_id.to_string(),
            treatment.name,
            treatment.description,
            treatment.frequency,
            treatment.start_date,
            treatment.end_date,
            treatment.created_at,
            treatment.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_treatment(
    conn: &Connection,
    id: &Uuid,
    patient_profile_id: &Uuid,
) -> Result<Option<Treatment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TREATMENT_COLUMNS} FROM treatments
         WHERE id = ?1 AND patient_profile_id = ?2"
    ))?;
    let mut rows = stmt.query_map(
        params![id.to_string(), patient_profile_id.to_string()],
        treatment_from_row,
    )?;
    rows.next().transpose().map_err(DatabaseError::from)
}

pub fn list_treatments(
    conn: &Connection,
    patient_profile_id: &Uuid,
) -> Result<Vec<Treatment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TREATMENT_COLUMNS} FROM treatments
         WHERE patient_profile_id = ?1
         ORDER BY name"
    ))?;
    let rows = stmt.query_map(params![patient_profile_id.to_string()], treatment_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Returns `true` if the scoped row existed and was updated.
pub fn update_treatment(conn: &Connection, treatment: &Treatment) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE treatments
         SET name = ?1, description = ?2, frequency = ?3, start_date = ?4, end_date = ?5, updated_at = ?6
         WHERE id = ?7 AND patient_profile_id = ?8",
        params![
            treatment.name,
            treatment.description,
            treatment.frequency,
            treatment.start_date,
            treatment.end_date,
            treatment.updated_at,
            treatment.id.to_string(),
            treatment.patient_profile_id.to_string(),
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_treatment(
    conn: &Connection,
    id: &Uuid,
    patient_profile_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM treatments WHERE id = ?1 AND patient_profile_id = ?2",
        params![id.to_string(), patient_profile_id.to_string()],
    )?;
    Ok(changed > 0)
}
