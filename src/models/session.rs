use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A server-side session record. The bearer token itself is never
/// stored; `token_hash` is its SHA-256 digest (base64).
#[derive(Debug, Clone)]
pub struct Session {
    pub token_hash: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
