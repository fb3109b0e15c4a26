use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::repository::uuid_column;
use crate::db::DatabaseError;
use crate::models::Note;

fn note_from_row(row: &Row) -> Result<Note, rusqlite::Error> {
    Ok(Note {
        id: uuid_column(0, row.get(0)?)?,
        patient_profile_id: uuid_column(1, row.get(1)?)?,
        title: row.get(2)?,
        body: row.get(3)?,
        pinned: row.get(4)?,
        created_at: row.get::<_, DateTime<Utc>>(5)?,
        updated_at: row.get::<_, DateTime<Utc>>(6)?,
    })
}

const NOTE_COLUMNS: &str = "id, patient_profile_id, title, body, pinned, created_at, updated_at";

pub fn insert_note(conn: &Connection, note: &Note) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO notes (id, patient_profile_id, title, body, pinned, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            note.id.to_string(),
            note.patient_profile_id.to_string(),
            note.title,
            note.body,
            note.pinned,
            note.created_at,
            note.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_note(
    conn: &Connection,
    id: &Uuid,
    patient_profile_id: &Uuid,
) -> Result<Option<Note>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1 AND patient_profile_id = ?2"
    ))?;
    let mut rows = stmt.query_map(
        params![id.to_string(), patient_profile_id.to_string()],
        note_from_row,
    )?;
    rows.next().transpose().map_err(DatabaseError::from)
}

/// Pinned notes first, then most recently updated.
pub fn list_notes(
    conn: &Connection,
    patient_profile_id: &Uuid,
) -> Result<Vec<Note>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {NOTE_COLUMNS} FROM notes
         WHERE patient_profile_id = ?1
         ORDER BY pinned DESC, updated_at DESC"
    ))?;
    let rows = stmt.query_map(params![patient_profile_id.to_string()], note_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Returns `true` if the scoped row existed and was updated.
pub fn update_note(conn: &Connection, note: &Note) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE notes SET title = ?1, body = ?2, pinned = ?3, updated_at = ?4
         WHERE id = ?5 AND patient_profile_id = ?6",
        params![
            note.title,
            note.body,
            note.pinned,
            note.updated_at,
            note.id.to_string(),
            note.patient_profile_id.to_string(),
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_note(
    conn: &Connection,
    id: &Uuid,
    patient_profile_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM notes WHERE id = ?1 AND patient_profile_id = ?2",
        params![id.to_string(), patient_profile_id.to_string()],
    )?;
    Ok(changed > 0)
}

pub fn count_notes(conn: &Connection, patient_profile_id: &Uuid) -> Result<u32, DatabaseError> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM notes WHERE patient_profile_id = ?1",
        params![patient_profile_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}
