use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::db::repository::{instant_column, uuid_column};
use crate::db::DatabaseError;
use crate::models::Session;

fn session_from_row(row: &Row) -> Result<Session, rusqlite::Error> {
    Ok(Session {
        token_hash: row.get(0)?,
        user_id: uuid_column(1, row.get(1)?)?,
        expires_at: instant_column(2, row.get(2)?)?,
        created_at: row.get::<_, DateTime<Utc>>(3)?,
    })
}

pub fn insert_session(conn: &Connection, session: &Session) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            session.token_hash,
            session.user_id.to_string(),
            session.expires_at.timestamp(),
            session.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_session(conn: &Connection, token_hash: &str) -> Result<Option<Session>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT token_hash, user_id, expires_at, created_at
         FROM sessions WHERE token_hash = ?1",
    )?;
    let mut rows = stmt.query_map(params![token_hash], session_from_row)?;
    rows.next().transpose().map_err(DatabaseError::from)
}

/// Returns `true` if a session row was removed.
pub fn delete_session(conn: &Connection, token_hash: &str) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        params![token_hash],
    )?;
    Ok(changed > 0)
}

/// Sweep sessions past their expiry. Returns the number removed.
pub fn delete_expired_sessions(
    conn: &Connection,
    now: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![now.timestamp()],
    )?;
    Ok(changed)
}
