use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::repository::{enum_column, uuid_column};
use crate::db::DatabaseError;
use crate::models::User;

fn user_from_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: uuid_column(0, row.get(0)?)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        role: enum_column(3, row.get(3)?)?,
        created_at: row.get::<_, DateTime<Utc>>(4)?,
    })
}

const USER_COLUMNS: &str = "id, email, password_hash, role, created_at";

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, email, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id.to_string(),
            user.email,
            user.password_hash,
            user.role.as_str(),
            user.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let mut stmt =
        conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
    let mut rows = stmt.query_map(params![id.to_string()], user_from_row)?;
    rows.next().transpose().map_err(DatabaseError::from)
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let mut stmt =
        conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))?;
    let mut rows = stmt.query_map(params![email], user_from_row)?;
    rows.next().transpose().map_err(DatabaseError::from)
}

pub fn update_user_password(
    conn: &Connection,
    id: &Uuid,
    password_hash: &str,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET password_hash = ?1 WHERE id = ?2",
        params![password_hash, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
