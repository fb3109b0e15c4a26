//! Patient profile endpoints.
//!
//! The profile row is created lazily on the first save, so a freshly
//! registered patient has none until they fill the form.

use axum::extract::State;
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::endpoints::require_field;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Caller;
use crate::db::repository::{get_profile_by_user, insert_profile, update_profile};
use crate::models::PatientProfile;

fn require_patient(caller: &Caller) -> Result<(), ApiError> {
    if !caller.is_patient() {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

/// `GET /api/profile` — the caller's own profile.
pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<PatientProfile>, ApiError> {
    require_patient(&caller)?;

    let conn = ctx.lock_db()?;
    let profile = get_profile_by_user(&conn, &caller.user_id)?
        .ok_or_else(|| ApiError::NotFound("Patient profile not found".into()))?;
    Ok(Json(profile))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileRequest {
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub conditions: Option<String>,
    pub emergency_contact: Option<String>,
}

/// `PUT /api/profile` — create on first save, update thereafter.
pub async fn save(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<PatientProfile>, ApiError> {
    require_patient(&caller)?;
    require_field("full_name", &request.full_name)?;

    let conn = ctx.lock_db()?;

    let profile = match get_profile_by_user(&conn, &caller.user_id)? {
        Some(existing) => {
            let updated = PatientProfile {
                full_name: request.full_name.trim().to_string(),
                birth_date: request.birth_date,
                blood_type: request.blood_type,
                allergies: request.allergies,
                conditions: request.conditions,
                emergency_contact: request.emergency_contact,
                updated_at: Utc::now(),
                ..existing
            };
            update_profile(&conn, &updated)?;
            updated
        }
        None => {
            let created = PatientProfile {
                id: Uuid::new_v4(),
                user_id: caller.user_id,
                full_name: request.full_name.trim().to_string(),
                birth_date: request.birth_date,
                blood_type: request.blood_type,
                allergies: request.allergies,
                conditions: request.conditions,
                emergency_contact: request.emergency_contact,
                updated_at: Utc::now(),
            };
            insert_profile(&conn, &created)?;
            tracing::info!(profile_id = %created.id, "patient profile created");
            created
        }
    };

    Ok(Json(profile))
}
