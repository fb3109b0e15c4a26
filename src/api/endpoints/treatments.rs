//! Treatment endpoints, scoped by patient profile.

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
    delete_treatment, get_treatment, insert_treatment, list_treatments, update_treatment,
};
use crate::models::Treatment;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreatmentRequest {
    pub name: String,
    pub description: Option<String>,
    pub frequency: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TreatmentRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_field("name", &self.name)?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(ApiError::Validation("end_date precedes start_date".into()));
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
pub struct TreatmentListResponse {
    pub treatments: Vec<Treatment>,
}

/// `GET /api/patients/:profile_id/treatments`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path(profile_id): Path<String>,
) -> Result<Json<TreatmentListResponse>, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Read)?;

    let treatments = list_treatments(&conn, &profile_id)?;
    Ok(Json(TreatmentListResponse { treatments }))
}

/// `POST /api/patients/:profile_id/treatments`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path(profile_id): Path<String>,
    Json(request): Json<TreatmentRequest>,
) -> Result<(StatusCode, Json<Treatment>), ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    request.validate()?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Write)?;

    let now = Utc::now();
    let treatment = Treatment {
        id: Uuid::new_v4(),
        patient_profile_id: profile_id,
        name: request.name.trim().to_string(),
        description: request.description,
        frequency: request.frequency,
        start_date: request.start_date,
        end_date: request.end_date,
        created_at: now,
        updated_at: now,
    };
    insert_treatment(&conn, &treatment)?;

    Ok((StatusCode::CREATED, Json(treatment)))
}

/// `GET /api/patients/:profile_id/treatments/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path((profile_id, treatment_id)): Path<(String, String)>,
) -> Result<Json<Treatment>, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    let treatment_id = parse_uuid_param("treatment ID", &treatment_id)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Read)?;

    let treatment = get_treatment(&conn, &treatment_id, &profile_id)?
        .ok_or_else(|| ApiError::NotFound("Treatment not found".into()))?;
    Ok(Json(treatment))
}

/// `PUT /api/patients/:profile_id/treatments/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path((profile_id, treatment_id)): Path<(String, String)>,
    Json(request): Json<TreatmentRequest>,
) -> Result<Json<Treatment>, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    let treatment_id = parse_uuid_param("treatment ID", &treatment_id)?;
    request.validate()?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Write)?;

    let existing = get_treatment(&conn, &treatment_id, &profile_id)?
        .ok_or_else(|| ApiError::NotFound("Treatment not found".into()))?;

    let treatment = Treatment {
        name: request.name.trim().to_string(),
        description: request.description,
        frequency: request.frequency,
        start_date: request.start_date,
        end_date: request.end_date,
        updated_at: Utc::now(),
        ..existing
    };
    update_treatment(&conn, &treatment)?;

    Ok(Json(treatment))
}

/// `DELETE /api/patients/:profile_id/treatments/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path((profile_id, treatment_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    let treatment_id = parse_uuid_param("treatment ID", &treatment_id)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Write)?;

    if !delete_treatment(&conn, &treatment_id, &profile_id)? {
        return Err(ApiError::NotFound("Treatment not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
