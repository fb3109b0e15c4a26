//! Medication endpoints, scoped by patient profile.
//!
//! Every handler resolves the access check before touching any row:
//! reads need a READ-level grant, mutations WRITE or better; the
//! owning patient passes unconditionally.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{check_profile_access, AccessAction};
use crate::api::endpoints::{parse_uuid_param, require_field};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Caller;
use crate::db::repository::{
    delete_medication, get_medication, insert_medication, list_medications, update_medication,
};
use crate::models::Medication;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MedicationRequest {
    pub name: String,
    pub dose: String,
    pub frequency: String,
    pub instructions: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl MedicationRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_field("name", &self.name)?;
        require_field("dose", &self.dose)?;
        require_field("frequency", &self.frequency)?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(ApiError::Validation("end_date precedes start_date".into()));
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
pub struct MedicationListResponse {
    pub medications: Vec<Medication>,
}

/// `GET /api/patients/:profile_id/medications`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path(profile_id): Path<String>,
) -> Result<Json<MedicationListResponse>, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Read)?;

    let medications = list_medications(&conn, &profile_id)?;
    Ok(Json(MedicationListResponse { medications }))
}

/// `POST /api/patients/:profile_id/medications`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path(profile_id): Path<String>,
    Json(request): Json<MedicationRequest>,
) -> Result<(StatusCode, Json<Medication>), ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    request.validate()?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Write)?;

    let now = Utc::now();
    let medication = Medication {
        id: Uuid::new_v4(),
        patient_profile_id: profile_id,
        name: request.name.trim().to_string(),
        dose: request.dose.trim().to_string(),
        frequency: request.frequency.trim().to_string(),
        instructions: request.instructions,
        start_date: request.start_date,
        end_date: request.end_date,
        active: request.active,
        created_at: now,
        updated_at: now,
    };
    insert_medication(&conn, &medication)?;

    Ok((StatusCode::CREATED, Json(medication)))
}

/// `GET /api/patients/:profile_id/medications/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path((profile_id, medication_id)): Path<(String, String)>,
) -> Result<Json<Medication>, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    let medication_id = parse_uuid_param("medication ID", &medication_id)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Read)?;

    let medication = get_medication(&conn, &medication_id, &profile_id)?
        .ok_or_else(|| ApiError::NotFound("Medication not found".into()))?;
    Ok(Json(medication))
}

/// `PUT /api/patients/:profile_id/medications/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path((profile_id, medication_id)): Path<(String, String)>,
    Json(request): Json<MedicationRequest>,
) -> Result<Json<Medication>, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    let medication_id = parse_uuid_param("medication ID", &medication_id)?;
    request.validate()?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Write)?;

    let existing = get_medication(&conn, &medication_id, &profile_id)?
        .ok_or_else(|| ApiError::NotFound("Medication not found".into()))?;

    let medication = Medication {
        name: request.name.trim().to_string(),
        dose: request.dose.trim().to_string(),
        frequency: request.frequency.trim().to_string(),
        instructions: request.instructions,
        start_date: request.start_date,
        end_date: request.end_date,
        active: request.active,
        updated_at: Utc::now(),
        ..existing
    };
    update_medication(&conn, &medication)?;

    Ok(Json(medication))
}

/// `DELETE /api/patients/:profile_id/medications/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path((profile_id, medication_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    let medication_id = parse_uuid_param("medication ID", &medication_id)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Write)?;

    if !delete_medication(&conn, &medication_id, &profile_id)? {
        return Err(ApiError::NotFound("Medication not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
