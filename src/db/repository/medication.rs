use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::repository::uuid_column;
use crate::db::DatabaseError;
use crate::models::Medication;

fn medication_from_row(row: &Row) -> Result<Medication, rusqlite::Error> {
    Ok(Medication {
        id: uuid_column(0, row.get(0)?)?,
        patient_profile_id: uuid_column(1, row.get(1)?)?,
        name: row.get(2)?,
        dose: row.get(3)?,
        frequency: row.get(4)?,
        instructions: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        active: row.get(8)?,
        created_at: row.get::<_, DateTime<Utc>>(9)?,
        updated_at: row.get::<_, DateTime<Utc>>(10)?,
    })
}

const MEDICATION_COLUMNS: &str =
    "id, patient_profile_id, name, dose, frequency, instructions, start_date, end_date, active, created_at, updated_at";

pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medications
         (id, patient_profile_id, name, dose, frequency, instructions, start_date, end_date, active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            med.id.to_string(),
            med.patient_profile_id.to_string(),
            med.name,
            med.dose,
            med.frequency,
            med.instructions,
            med.start_date,
            med.end_date,
            med.active,
            med.created_at,
            med.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_medication(
    conn: &Connection,
    id: &Uuid,
    patient_profile_id: &Uuid,
) -> Result<Option<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEDICATION_COLUMNS} FROM medications
         WHERE id = ?1 AND patient_profile_id = ?2"
    ))?;
    let mut rows = stmt.query_map(
        params![id.to_string(), patient_profile_id.to_string()],
        medication_from_row,
    )?;
    rows.next().transpose().map_err(DatabaseError::from)
}

pub fn list_medications(
    conn: &Connection,
    patient_profile_id: &Uuid,
) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEDICATION_COLUMNS} FROM medications
         WHERE patient_profile_id = ?1
         ORDER BY active DESC, name"
    ))?;
    let rows = stmt.query_map(params![patient_profile_id.to_string()], medication_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Returns `true` if the scoped row existed and was updated.
pub fn update_medication(conn: &Connection, med: &Medication) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE medications
         SET name = ?1, dose = ?2, frequency = ?3, instructions = ?4,
             start_date = ?5, end_date = ?6, active = ?7, updated_at = ?8
         WHERE id = ?9 AND patient_profile_id = ?10",
        params![
            med.name,
            med.dose,
            med.frequency,
            med.instructions,
            med.start_date,
            med.end_date,
            med.active,
            med.updated_at,
            med.id.to_string(),
            med.patient_profile_id.to_string(),
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_medication(
    conn: &Connection,
    id: &Uuid,
    patient_profile_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM medications WHERE id = ?1 AND patient_profile_id = ?2",
        params![id.to_string(), patient_profile_id.to_string()],
    )?;
    Ok(changed > 0)
}

pub fn count_active_medications(
    conn: &Connection,
    patient_profile_id: &Uuid,
) -> Result<u32, DatabaseError> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM medications WHERE patient_profile_id = ?1 AND active = 1",
        params![patient_profile_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}
