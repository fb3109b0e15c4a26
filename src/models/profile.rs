use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A patient's demographic and medical summary. One-to-one with a
/// patient user; the aggregation root every clinical entity, invite
/// and permission is scoped to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub conditions: Option<String>,
    pub emergency_contact: Option<String>,
    pub updated_at: DateTime<Utc>,
}
