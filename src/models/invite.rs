use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single-use, time-limited invitation binding one caregiver to one
/// patient profile. Redeemable only while `used == false` and
/// `expires_at` is in the future; permanently inert afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaregiverInvite {
    pub id: Uuid,
    pub code: String,
    pub patient_profile_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl CaregiverInvite {
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        !self.used && self.expires_at > now
    }
}
