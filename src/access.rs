//! Permission-gated access to a patient profile's scoped resources.
//!
//! Every clinical read/write resolves through [`check_profile_access`]
//! before any entity is touched: the owning patient is always allowed,
//! a caregiver needs a standing grant at a sufficient level, and
//! everyone else is denied with a constant outcome — the check runs
//! before any lookup so a denial never reveals whether the resource
//! exists.

use rusqlite::Connection;
use uuid::Uuid;

use crate::auth::Caller;
use crate::db::repository::get_permission;
use crate::db::DatabaseError;
use crate::models::enums::PermissionLevel;

/// What the caller is about to do with the profile's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessAction {
    Read,
    Write,
}

impl AccessAction {
    /// Minimum grant level for the action. Levels are totally ordered,
    /// so admin satisfies both.
    pub fn required_level(&self) -> PermissionLevel {
        match self {
            AccessAction::Read => PermissionLevel::Read,
            AccessAction::Write => PermissionLevel::Write,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Access to this profile is not permitted")]
    Denied,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Decide whether `caller` may perform `action` against
/// `patient_profile_id`. Consults the permission table on every call,
/// so a revocation takes effect on the caregiver's next request.
pub fn check_profile_access(
    conn: &Connection,
    caller: &Caller,
    patient_profile_id: &Uuid,
    action: AccessAction,
) -> Result<(), AccessError> {
    // The owning patient needs no grant
    if caller.profile_id.as_ref() == Some(patient_profile_id) {
        return Ok(());
    }

    if caller.is_caregiver() {
        if let Some(permission) = get_permission(conn, patient_profile_id, &caller.user_id)? {
            if permission.level.satisfies(action.required_level()) {
                return Ok(());
            }
        }
    }

    // Patients addressing someone else's profile land here too
    Err(AccessError::Denied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::Role;
    use crate::models::{PatientProfile, User};
    use chrono::Utc;

    fn make_user(conn: &Connection, email: &str, role: Role) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: "$hash".into(),
            role,
            created_at: Utc::now(),
        };
        insert_user(conn, &user).unwrap();
        user
    }

    fn make_profile(conn: &Connection, user_id: &Uuid) -> Uuid {
        let profile = PatientProfile {
            id: Uuid::new_v4(),
            user_id: *user_id,
            full_name: "Ana García".into(),
            birth_date: None,
            blood_type: None,
            allergies: None,
            conditions: None,
            emergency_contact: None,
            updated_at: Utc::now(),
        };
        insert_profile(conn, &profile).unwrap();
        profile.id
    }

    fn caller_for(user: &User, profile_id: Option<Uuid>) -> Caller {
        Caller {
            user_id: user.id,
            role: user.role,
            profile_id,
        }
    }

    #[test]
    fn owning_patient_always_allowed() {
        let conn = open_memory_database().unwrap();
        let patient = make_user(&conn, "ana@example.com", Role::Patient);
        let profile_id = make_profile(&conn, &patient.id);
        let caller = caller_for(&patient, Some(profile_id));

        assert!(check_profile_access(&conn, &caller, &profile_id, AccessAction::Read).is_ok());
        assert!(check_profile_access(&conn, &caller, &profile_id, AccessAction::Write).is_ok());
    }

    #[test]
    fn other_patient_denied() {
        let conn = open_memory_database().unwrap();
        let ana = make_user(&conn, "ana@example.com", Role::Patient);
        let eva = make_user(&conn, "eva@example.com", Role::Patient);
        let ana_profile = make_profile(&conn, &ana.id);
        let eva_profile = make_profile(&conn, &eva.id);
        let eva_caller = caller_for(&eva, Some(eva_profile));

        assert!(matches!(
            check_profile_access(&conn, &eva_caller, &ana_profile, AccessAction::Read),
            Err(AccessError::Denied)
        ));
    }

    #[test]
    fn caregiver_without_grant_denied() {
        let conn = open_memory_database().unwrap();
        let patient = make_user(&conn, "ana@example.com", Role::Patient);
        let caregiver = make_user(&conn, "luis@example.com", Role::Caregiver);
        let profile_id = make_profile(&conn, &patient.id);
        let caller = caller_for(&caregiver, None);

        for action in [AccessAction::Read, AccessAction::Write] {
            assert!(matches!(
                check_profile_access(&conn, &caller, &profile_id, action),
                Err(AccessError::Denied)
            ));
        }
    }

    #[test]
    fn grant_levels_gate_actions() {
        let conn = open_memory_database().unwrap();
        let patient = make_user(&conn, "ana@example.com", Role::Patient);
        let caregiver = make_user(&conn, "luis@example.com", Role::Caregiver);
        let profile_id = make_profile(&conn, &patient.id);
        let caller = caller_for(&caregiver, None);

        let cases = [
            (PermissionLevel::Read, true, false),
            (PermissionLevel::Write, true, true),
            (PermissionLevel::Admin, true, true),
        ];
        for (level, can_read, can_write) in cases {
            grant_permission_if_absent(&conn, &profile_id, &caregiver.id, level, Utc::now())
                .unwrap();
            set_permission_level(&conn, &profile_id, &caregiver.id, level).unwrap();

            assert_eq!(
                check_profile_access(&conn, &caller, &profile_id, AccessAction::Read).is_ok(),
                can_read,
                "{level:?} read"
            );
            assert_eq!(
                check_profile_access(&conn, &caller, &profile_id, AccessAction::Write).is_ok(),
                can_write,
                "{level:?} write"
            );
        }
    }

    #[test]
    fn revocation_takes_effect_immediately() {
        let conn = open_memory_database().unwrap();
        let patient = make_user(&conn, "ana@example.com", Role::Patient);
        let caregiver = make_user(&conn, "luis@example.com", Role::Caregiver);
        let profile_id = make_profile(&conn, &patient.id);
        let caller = caller_for(&caregiver, None);

        grant_permission_if_absent(
            &conn,
            &profile_id,
            &caregiver.id,
            PermissionLevel::Write,
            Utc::now(),
        )
        .unwrap();
        assert!(check_profile_access(&conn, &caller, &profile_id, AccessAction::Write).is_ok());

        delete_permission(&conn, &profile_id, &caregiver.id).unwrap();
        assert!(matches!(
            check_profile_access(&conn, &caller, &profile_id, AccessAction::Read),
            Err(AccessError::Denied)
        ));
        assert!(matches!(
            check_profile_access(&conn, &caller, &profile_id, AccessAction::Write),
            Err(AccessError::Denied)
        ));
    }
}
