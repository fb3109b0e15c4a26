//! Permission-grant management, from the patient's side.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::endpoints::parse_uuid_param;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Caller;
use crate::db::repository::{delete_permission, list_grants_for_profile, set_permission_level};
use crate::models::enums::PermissionLevel;
use crate::models::CaregiverGrant;

fn own_profile_id(caller: &Caller) -> Result<Uuid, ApiError> {
    if !caller.is_patient() {
        return Err(ApiError::Forbidden);
    }
    caller
        .profile_id
        .ok_or_else(|| ApiError::NotFound("Patient profile not found".into()))
}

#[derive(Serialize)]
pub struct CaregiverListResponse {
    pub caregivers: Vec<CaregiverGrant>,
}

/// `GET /api/caregivers` — everyone with a grant on the caller's profile.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<CaregiverListResponse>, ApiError> {
    let profile_id = own_profile_id(&caller)?;

    let conn = ctx.lock_db()?;
    let caregivers = list_grants_for_profile(&conn, &profile_id)?;
    Ok(Json(CaregiverListResponse { caregivers }))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateLevelRequest {
    pub level: PermissionLevel,
}

#[derive(Serialize)]
pub struct UpdateLevelResponse {
    pub caregiver_id: Uuid,
    pub level: PermissionLevel,
}

/// `PATCH /api/caregivers/:caregiver_id` — change a grant's level.
pub async fn update_level(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path(caregiver_id): Path<String>,
    Json(request): Json<UpdateLevelRequest>,
) -> Result<Json<UpdateLevelResponse>, ApiError> {
    let profile_id = own_profile_id(&caller)?;
    let caregiver_id = parse_uuid_param("caregiver ID", &caregiver_id)?;

    let conn = ctx.lock_db()?;
    if !set_permission_level(&conn, &profile_id, &caregiver_id, request.level)? {
        return Err(ApiError::NotFound("Permission not found".into()));
    }

    tracing::info!(
        profile_id = %profile_id,
        caregiver_id = %caregiver_id,
        level = request.level.as_str(),
        "permission level changed"
    );

    Ok(Json(UpdateLevelResponse {
        caregiver_id,
        level: request.level,
    }))
}

/// `DELETE /api/caregivers/:caregiver_id` — revoke a grant.
///
/// Takes effect on the caregiver's next request; every access check
/// re-reads the permission table.
pub async fn revoke(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path(caregiver_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let profile_id = own_profile_id(&caller)?;
    let caregiver_id = parse_uuid_param("caregiver ID", &caregiver_id)?;

    let conn = ctx.lock_db()?;
    if !delete_permission(&conn, &profile_id, &caregiver_id)? {
        return Err(ApiError::NotFound("Permission not found".into()));
    }

    tracing::info!(profile_id = %profile_id, caregiver_id = %caregiver_id, "permission revoked");

    Ok(StatusCode::NO_CONTENT)
}
