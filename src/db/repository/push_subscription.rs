use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::repository::uuid_column;
use crate::db::DatabaseError;
use crate::models::PushSubscription;

fn subscription_from_row(row: &Row) -> Result<PushSubscription, rusqlite::Error> {
    Ok(PushSubscription {
        id: uuid_column(0, row.get(0)?)?,
        user_id: uuid_column(1, row.get(1)?)?,
        endpoint: row.get(2)?,
        p256dh_key: row.get(3)?,
        auth_key: row.get(4)?,
        created_at: row.get::<_, DateTime<Utc>>(5)?,
    })
}

/// Store or refresh a subscription. Re-subscribing the same endpoint
/// replaces the stored keys.
pub fn upsert_push_subscription(
    conn: &Connection,
    sub: &PushSubscription,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO push_subscriptions (id, user_id, endpoint, p256dh_key, auth_key, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (user_id, endpoint)
         DO UPDATE SET p256dh_key = excluded.p256dh_key, auth_key = excluded.auth_key",
        params![
            sub.id.to_string(),
            sub.user_id.to_string(),
            sub.endpoint,
            sub.p256dh_key,
            sub.auth_key,
            sub.created_at,
        ],
    )?;
    Ok(())
}

pub fn list_push_subscriptions(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<PushSubscription>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, endpoint, p256dh_key, auth_key, created_at
         FROM push_subscriptions WHERE user_id = ?1 ORDER BY created_at",
    )?;
    let rows = stmt.query_map(params![user_id.to_string()], subscription_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Returns `true` if a subscription row was removed.
pub fn delete_push_subscription(
    conn: &Connection,
    user_id: &Uuid,
    endpoint: &str,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM push_subscriptions WHERE user_id = ?1 AND endpoint = ?2",
        params![user_id.to_string(), endpoint],
    )?;
    Ok(changed > 0)
}
