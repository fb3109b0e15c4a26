//! Patient-facing views for caregivers: accessible patients and the
//! per-profile overview dashboard.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Serialize;

use crate::access::{check_profile_access, AccessAction};
use crate::api::endpoints::parse_uuid_param;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Caller;
use crate::db::repository::{
    count_active_medications, count_notes, count_upcoming_appointments,
    list_patients_for_caregiver, next_appointment,
};
use crate::models::{Appointment, PatientAccess};

#[derive(Serialize)]
pub struct PatientListResponse {
    pub patients: Vec<PatientAccess>,
}

/// `GET /api/patients` — profiles the calling caregiver may access.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<PatientListResponse>, ApiError> {
    if !caller.is_caregiver() {
        return Err(ApiError::Forbidden);
    }

    let conn = ctx.lock_db()?;
    let patients = list_patients_for_caregiver(&conn, &caller.user_id)?;
    Ok(Json(PatientListResponse { patients }))
}

#[derive(Serialize)]
pub struct OverviewResponse {
    pub active_medications: u32,
    pub upcoming_appointments: u32,
    pub notes: u32,
    pub next_appointment: Option<Appointment>,
}

/// `GET /api/patients/:profile_id/overview` — dashboard counts.
pub async fn overview(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path(profile_id): Path<String>,
) -> Result<Json<OverviewResponse>, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Read)?;

    let now = Utc::now();
    Ok(Json(OverviewResponse {
        active_medications: count_active_medications(&conn, &profile_id)?,
        upcoming_appointments: count_upcoming_appointments(&conn, &profile_id, now)?,
        notes: count_notes(&conn, &profile_id)?,
        next_appointment: next_appointment(&conn, &profile_id, now)?,
    }))
}
