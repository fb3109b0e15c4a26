//! Authentication: password hashing, session issuance/verification,
//! and the explicit caller identity handed to every operation.

pub mod password;
pub mod session;

use uuid::Uuid;

use crate::models::enums::Role;

/// The authenticated caller, resolved once by the auth middleware and
/// passed explicitly to every operation — identity is never read from
/// ambient state inside a handler.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
    /// The caller's own patient profile, present only for patients
    /// that have saved one.
    pub profile_id: Option<Uuid>,
}

impl Caller {
    pub fn is_patient(&self) -> bool {
        self.role == Role::Patient
    }

    pub fn is_caregiver(&self) -> bool {
        self.role == Role::Caregiver
    }
}
