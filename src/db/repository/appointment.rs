use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::repository::{instant_column, uuid_column};
use crate::db::DatabaseError;
use crate::models::Appointment;

fn appointment_from_row(row: &Row) -> Result<Appointment, rusqlite::Error> {
    Ok(Appointment {
        id: uuid_column(0, row.get(0)?)?,
        patient_profile_id: uuid_column(1, row.get(1)?)?,
        title: row.get(2)?,
        location: row.get(3)?,
        clinician: row.get(4)?,
        scheduled_at: instant_column(5, row.get(5)?)?,
        notes: row.get(6)?,
        created_at: row.get::<_, DateTime<Utc>>(7)?,
        updated_at: row.get::<_, DateTime<Utc>>(8)?,
    })
}

const APPOINTMENT_COLUMNS: &str =
    "id, patient_profile_id, title, location, clinician, scheduled_at, notes, created_at, updated_at";

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments
         (id, patient_profile_id, title, location, clinician, scheduled_at, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            appt.id.to_string(),
            appt.patient_profile_id.to_string(),
            appt.title,
            appt.location,
            appt.clinician,
            appt.scheduled_at.timestamp(),
            appt.notes,
            appt.created_at,
            appt.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_appointment(
    conn: &Connection,
    id: &Uuid,
    patient_profile_id: &Uuid,
) -> Result<Option<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE id = ?1 AND patient_profile_id = ?2"
    ))?;
    let mut rows = stmt.query_map(
        params![id.to_string(), patient_profile_id.to_string()],
        appointment_from_row,
    )?;
    rows.next().transpose().map_err(DatabaseError::from)
}

pub fn list_appointments(
    conn: &Connection,
    patient_profile_id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE patient_profile_id = ?1
         ORDER BY scheduled_at"
    ))?;
    let rows = stmt.query_map(params![patient_profile_id.to_string()], appointment_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Appointments in `[start, end)`, ordered by schedule. Backs the
/// calendar view.
pub fn list_appointments_between(
    conn: &Connection,
    patient_profile_id: &Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE patient_profile_id = ?1 AND scheduled_at >= ?2 AND scheduled_at < ?3
         ORDER BY scheduled_at"
    ))?;
    let rows = stmt.query_map(
        params![
            patient_profile_id.to_string(),
            start.timestamp(),
            end.timestamp()
        ],
        appointment_from_row,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn next_appointment(
    conn: &Connection,
    patient_profile_id: &Uuid,
    now: DateTime<Utc>,
) -> Result<Option<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE patient_profile_id = ?1 AND scheduled_at >= ?2
         ORDER BY scheduled_at LIMIT 1"
    ))?;
    let mut rows = stmt.query_map(
        params![patient_profile_id.to_string(), now.timestamp()],
        appointment_from_row,
    )?;
    rows.next().transpose().map_err(DatabaseError::from)
}

pub fn count_upcoming_appointments(
    conn: &Connection,
    patient_profile_id: &Uuid,
    now: DateTime<Utc>,
) -> Result<u32, DatabaseError> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE patient_profile_id = ?1 AND scheduled_at >= ?2",
        params![patient_profile_id.to_string(), now.timestamp()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Returns `true` if the scoped row existed and was updated.
pub fn update_appointment(conn: &Connection, appt: &Appointment) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments
         SET title = ?1, location = ?2, clinician = ?3, scheduled_at = ?4, notes = ?5, updated_at = ?6
         WHERE id = ?7 AND patient_profile_id = ?8",
        params![
            appt.title,
            appt.location,
            appt.clinician,
            appt.scheduled_at.timestamp(),
            appt.notes,
            appt.updated_at,
            appt.id.to_string(),
            appt.patient_profile_id.to_string(),
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_appointment(
    conn: &Connection,
    id: &Uuid,
    patient_profile_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM appointments WHERE id = ?1 AND patient_profile_id = ?2",
        params![id.to_string(), patient_profile_id.to_string()],
    )?;
    Ok(changed > 0)
}
