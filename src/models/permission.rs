use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::PermissionLevel;

/// A standing access grant: one caregiver, one patient profile, one
/// level. Unique per (patient_profile_id, caregiver_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub patient_profile_id: Uuid,
    pub caregiver_id: Uuid,
    pub level: PermissionLevel,
    pub granted_at: DateTime<Utc>,
}

/// A grant as the patient sees it, with the caregiver's email attached.
#[derive(Debug, Clone, Serialize)]
pub struct CaregiverGrant {
    pub caregiver_id: Uuid,
    pub caregiver_email: String,
    pub level: PermissionLevel,
    pub granted_at: DateTime<Utc>,
}

/// A grant as the caregiver sees it, with the patient's name attached.
#[derive(Debug, Clone, Serialize)]
pub struct PatientAccess {
    pub patient_profile_id: Uuid,
    pub patient_name: String,
    pub level: PermissionLevel,
    pub granted_at: DateTime<Utc>,
}
