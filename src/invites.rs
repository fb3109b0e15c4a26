//! Caregiver invites: issuance and redemption.
//!
//! An invite is a single-use, 48-hour code a patient hands to one
//! caregiver. Redemption establishes the standing permission grant and
//! consumes the code in the same transaction, with a conditional
//! update on the invite row so two racing redemptions of the same code
//! resolve to exactly one winner.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{
    get_invite_by_code, get_profile, grant_permission_if_absent, insert_invite, mark_invite_used,
    profile_exists,
};
use crate::db::DatabaseError;
use crate::models::enums::PermissionLevel;
use crate::models::{CaregiverInvite, Permission};

/// Invite lifetime.
pub const INVITE_TTL_HOURS: i64 = 48;

/// Invite code length. 36^8 codes make collisions negligible; the
/// UNIQUE column is the backstop.
pub const INVITE_CODE_LEN: usize = 8;

/// Newly redeemed grants start at the least-privileged level; the
/// patient raises it afterwards if needed.
pub const DEFAULT_GRANT_LEVEL: PermissionLevel = PermissionLevel::Read;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, thiserror::Error)]
pub enum InviteError {
    #[error("No invite matches this code")]
    NotFound,
    #[error("Invite already used or expired")]
    Expired,
    #[error("Patient profile not found")]
    ProfileNotFound,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Generate a fresh invite code: 8 uppercase alphanumeric characters.
pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Create an invite for `patient_profile_id`. The profile must exist —
/// checked here so a bad id fails at issuance, not at redemption.
/// The returned invite carries the plaintext code; it is not
/// retrievable later.
pub fn issue_invite(
    conn: &Connection,
    patient_profile_id: &Uuid,
    now: DateTime<Utc>,
) -> Result<CaregiverInvite, InviteError> {
    if !profile_exists(conn, patient_profile_id)? {
        return Err(InviteError::ProfileNotFound);
    }

    let invite = CaregiverInvite {
        id: Uuid::new_v4(),
        code: generate_invite_code(),
        patient_profile_id: *patient_profile_id,
        expires_at: now + Duration::hours(INVITE_TTL_HOURS),
        used: false,
        created_at: now,
    };
    insert_invite(conn, &invite)?;
    Ok(invite)
}

/// The outcome of a successful redemption.
#[derive(Debug, Clone)]
pub struct Redemption {
    pub permission: Permission,
    pub patient_name: String,
}

/// Redeem `code` for `caregiver_id`.
///
/// Consuming the invite and upserting the permission happen in one
/// transaction: either the caregiver holds a grant and the code is
/// dead, or neither. The `used` flip is conditional on the row still
/// being live, so the loser of a concurrent double-redeem observes
/// zero rows affected and gets [`InviteError::Expired`].
pub fn redeem_invite(
    conn: &mut Connection,
    caregiver_id: &Uuid,
    code: &str,
    now: DateTime<Utc>,
) -> Result<Redemption, InviteError> {
    let code = code.trim().to_ascii_uppercase();

    let tx = conn.transaction().map_err(DatabaseError::from)?;

    let invite = get_invite_by_code(&tx, &code)?.ok_or(InviteError::NotFound)?;
    if !invite.is_redeemable(now) {
        return Err(InviteError::Expired);
    }

    if !mark_invite_used(&tx, &invite.id, now)? {
        // Lost the race against a concurrent redemption
        return Err(InviteError::Expired);
    }

    let permission = grant_permission_if_absent(
        &tx,
        &invite.patient_profile_id,
        caregiver_id,
        DEFAULT_GRANT_LEVEL,
        now,
    )?;

    let patient_name = get_profile(&tx, &invite.patient_profile_id)?
        .map(|p| p.full_name)
        .unwrap_or_default();

    tx.commit().map_err(DatabaseError::from)?;

    Ok(Redemption {
        permission,
        patient_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::Role;
    use crate::models::{PatientProfile, User};

    fn setup() -> (Connection, Uuid, Uuid) {
        let conn = open_memory_database().unwrap();
        let patient = User {
            id: Uuid::new_v4(),
            email: "ana@example.com".into(),
            password_hash: "$hash".into(),
            role: Role::Patient,
            created_at: Utc::now(),
        };
        insert_user(&conn, &patient).unwrap();
        let profile = PatientProfile {
            id: Uuid::new_v4(),
            user_id: patient.id,
            full_name: "Ana García".into(),
            birth_date: None,
            blood_type: None,
            allergies: None,
            conditions: None,
            emergency_contact: None,
            updated_at: Utc::now(),
        };
        insert_profile(&conn, &profile).unwrap();
        let caregiver = User {
            id: Uuid::new_v4(),
            email: "luis@example.com".into(),
            password_hash: "$hash".into(),
            role: Role::Caregiver,
            created_at: Utc::now(),
        };
        insert_user(&conn, &caregiver).unwrap();
        (conn, profile.id, caregiver.id)
    }

    #[test]
    fn generated_codes_are_well_formed() {
        for _ in 0..100 {
            let code = generate_invite_code();
            assert_eq!(code.len(), INVITE_CODE_LEN);
            assert!(code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn issue_creates_redeemable_invite() {
        let (conn, profile_id, _) = setup();
        let now = Utc::now();
        let invite = issue_invite(&conn, &profile_id, now).unwrap();

        assert_eq!(invite.patient_profile_id, profile_id);
        assert_eq!(invite.expires_at, now + Duration::hours(INVITE_TTL_HOURS));
        assert!(!invite.used);
        assert!(get_invite_by_code(&conn, &invite.code).unwrap().is_some());
    }

    #[test]
    fn issue_rejects_missing_profile() {
        let (conn, _, _) = setup();
        let result = issue_invite(&conn, &Uuid::new_v4(), Utc::now());
        assert!(matches!(result, Err(InviteError::ProfileNotFound)));
    }

    #[test]
    fn redeem_grants_read_and_consumes_code() {
        let (mut conn, profile_id, caregiver_id) = setup();
        let invite = issue_invite(&conn, &profile_id, Utc::now()).unwrap();

        let redemption = redeem_invite(&mut conn, &caregiver_id, &invite.code, Utc::now()).unwrap();
        assert_eq!(redemption.permission.patient_profile_id, profile_id);
        assert_eq!(redemption.permission.caregiver_id, caregiver_id);
        assert_eq!(redemption.permission.level, DEFAULT_GRANT_LEVEL);
        assert_eq!(redemption.patient_name, "Ana García");

        let stored = get_invite_by_code(&conn, &invite.code).unwrap().unwrap();
        assert!(stored.used);
    }

    #[test]
    fn redeem_is_case_insensitive_on_input() {
        let (mut conn, profile_id, caregiver_id) = setup();
        let invite = issue_invite(&conn, &profile_id, Utc::now()).unwrap();
        let sloppy = format!("  {}  ", invite.code.to_ascii_lowercase());

        assert!(redeem_invite(&mut conn, &caregiver_id, &sloppy, Utc::now()).is_ok());
    }

    #[test]
    fn second_redemption_fails_without_new_grant() {
        let (mut conn, profile_id, caregiver_id) = setup();
        let invite = issue_invite(&conn, &profile_id, Utc::now()).unwrap();

        redeem_invite(&mut conn, &caregiver_id, &invite.code, Utc::now()).unwrap();
        let second = redeem_invite(&mut conn, &caregiver_id, &invite.code, Utc::now());
        assert!(matches!(second, Err(InviteError::Expired)));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM permissions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn unknown_code_is_not_found() {
        let (mut conn, _, caregiver_id) = setup();
        let result = redeem_invite(&mut conn, &caregiver_id, "NOSUCH00", Utc::now());
        assert!(matches!(result, Err(InviteError::NotFound)));
    }

    #[test]
    fn expired_invite_fails_even_when_unused() {
        let (mut conn, profile_id, caregiver_id) = setup();
        let issued_at = Utc::now() - Duration::hours(INVITE_TTL_HOURS + 1);
        let invite = issue_invite(&conn, &profile_id, issued_at).unwrap();

        // 49 hours after issuance on a 48-hour window
        let result = redeem_invite(&mut conn, &caregiver_id, &invite.code, Utc::now());
        assert!(matches!(result, Err(InviteError::Expired)));

        let stored = get_invite_by_code(&conn, &invite.code).unwrap().unwrap();
        assert!(!stored.used);
    }

    #[test]
    fn redemption_race_has_single_winner() {
        let (mut conn, profile_id, caregiver_id) = setup();
        let other_caregiver = User {
            id: Uuid::new_v4(),
            email: "marta@example.com".into(),
            password_hash: "$hash".into(),
            role: Role::Caregiver,
            created_at: Utc::now(),
        };
        insert_user(&conn, &other_caregiver).unwrap();

        let invite = issue_invite(&conn, &profile_id, Utc::now()).unwrap();

        // Simulate the loser's schedule: the winner's conditional update
        // lands first, then the loser re-runs the same statement.
        assert!(mark_invite_used(&conn, &invite.id, Utc::now()).unwrap());
        let loser = redeem_invite(&mut conn, &other_caregiver.id, &invite.code, Utc::now());
        assert!(matches!(loser, Err(InviteError::Expired)));

        // The winner's grant path still completes normally
        grant_permission_if_absent(
            &conn,
            &profile_id,
            &caregiver_id,
            DEFAULT_GRANT_LEVEL,
            Utc::now(),
        )
        .unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM permissions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn redeeming_new_code_keeps_existing_level() {
        let (mut conn, profile_id, caregiver_id) = setup();

        let first = issue_invite(&conn, &profile_id, Utc::now()).unwrap();
        redeem_invite(&mut conn, &caregiver_id, &first.code, Utc::now()).unwrap();
        set_permission_level(&conn, &profile_id, &caregiver_id, PermissionLevel::Admin).unwrap();

        // A second invite to the same caregiver must not downgrade
        let second = issue_invite(&conn, &profile_id, Utc::now()).unwrap();
        let redemption = redeem_invite(&mut conn, &caregiver_id, &second.code, Utc::now()).unwrap();
        assert_eq!(redemption.permission.level, PermissionLevel::Admin);
    }
}
