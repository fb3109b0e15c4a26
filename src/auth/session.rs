//! Session token issuance and verification.
//!
//! Tokens are 32 bytes of entropy, URL-safe base64. Only the SHA-256
//! digest is stored, alongside the subject and a fixed 7-day expiry —
//! a presented token that was tampered with simply matches no stored
//! digest. No rotation or refresh: after expiry the client logs in
//! again.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{delete_session, get_session, insert_session};
use crate::db::DatabaseError;
use crate::models::Session;

/// Fixed session lifetime.
pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session token not recognized")]
    Invalid,
    #[error("Session token expired")]
    Expired,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest a bearer token for storage and lookup.
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    base64::engine::general_purpose::STANDARD_NO_PAD.encode(hasher.finalize())
}

/// Create a session for `user_id` and return the plaintext token —
/// the only time it exists outside the client.
pub fn issue_session(
    conn: &Connection,
    user_id: &Uuid,
    now: DateTime<Utc>,
) -> Result<String, DatabaseError> {
    let token = generate_token();
    insert_session(
        conn,
        &Session {
            token_hash: hash_token(&token),
            user_id: *user_id,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
            created_at: now,
        },
    )?;
    Ok(token)
}

/// Resolve a presented token to its session. Unknown digests are
/// `Invalid`; an expired session is deleted and reported `Expired`.
pub fn verify_session(
    conn: &Connection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Session, SessionError> {
    let hash = hash_token(token);
    let session = get_session(conn, &hash)?.ok_or(SessionError::Invalid)?;
    if session.is_expired(now) {
        delete_session(conn, &hash)?;
        return Err(SessionError::Expired);
    }
    Ok(session)
}

/// Log out: drop the session row. Returns `true` if one existed.
pub fn revoke_session(conn: &Connection, token: &str) -> Result<bool, DatabaseError> {
    delete_session(conn, &hash_token(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::Role;
    use crate::models::User;

    fn user_in_db(conn: &Connection) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            email: "ana@example.com".into(),
            password_hash: "$hash".into(),
            role: Role::Patient,
            created_at: Utc::now(),
        };
        crate::db::repository::insert_user(conn, &user).unwrap();
        user.id
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
        assert!(!t1.is_empty());
    }

    #[test]
    fn hash_token_is_deterministic() {
        assert_eq!(hash_token("test"), hash_token("test"));
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let conn = open_memory_database().unwrap();
        let user_id = user_in_db(&conn);

        let token = issue_session(&conn, &user_id, Utc::now()).unwrap();
        let session = verify_session(&conn, &token, Utc::now()).unwrap();
        assert_eq!(session.user_id, user_id);
    }

    #[test]
    fn tampered_token_is_invalid() {
        let conn = open_memory_database().unwrap();
        let user_id = user_in_db(&conn);

        let token = issue_session(&conn, &user_id, Utc::now()).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });

        assert!(matches!(
            verify_session(&conn, &tampered, Utc::now()),
            Err(SessionError::Invalid)
        ));
    }

    #[test]
    fn expired_session_rejected_and_removed() {
        let conn = open_memory_database().unwrap();
        let user_id = user_in_db(&conn);

        let issued_at = Utc::now() - Duration::days(SESSION_TTL_DAYS + 1);
        let token = issue_session(&conn, &user_id, issued_at).unwrap();

        assert!(matches!(
            verify_session(&conn, &token, Utc::now()),
            Err(SessionError::Expired)
        ));
        // The expired row is gone, so a retry reports Invalid
        assert!(matches!(
            verify_session(&conn, &token, Utc::now()),
            Err(SessionError::Invalid)
        ));
    }

    #[test]
    fn session_valid_until_seven_days() {
        let conn = open_memory_database().unwrap();
        let user_id = user_in_db(&conn);

        let issued_at = Utc::now() - Duration::days(SESSION_TTL_DAYS) + Duration::hours(1);
        let token = issue_session(&conn, &user_id, issued_at).unwrap();
        assert!(verify_session(&conn, &token, Utc::now()).is_ok());
    }

    #[test]
    fn revoke_drops_session() {
        let conn = open_memory_database().unwrap();
        let user_id = user_in_db(&conn);

        let token = issue_session(&conn, &user_id, Utc::now()).unwrap();
        assert!(revoke_session(&conn, &token).unwrap());
        assert!(matches!(
            verify_session(&conn, &token, Utc::now()),
            Err(SessionError::Invalid)
        ));
        assert!(!revoke_session(&conn, &token).unwrap());
    }
}
