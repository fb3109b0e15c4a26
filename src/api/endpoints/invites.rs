//! Caregiver invite endpoints.
//!
//! Patients issue and cancel invites for their own profile; caregivers
//! redeem a code to receive a standing permission grant.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::endpoints::{parse_uuid_param, require_field};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Caller;
use crate::db::repository::list_pending_invites;
use crate::invites;
use crate::models::enums::PermissionLevel;
use crate::models::CaregiverInvite;

/// A patient's own profile id, or `NotFound` if they never saved one —
/// an invite cannot reference a profile that does not exist.
fn own_profile_id(caller: &Caller) -> Result<Uuid, ApiError> {
    if !caller.is_patient() {
        return Err(ApiError::Forbidden);
    }
    caller
        .profile_id
        .ok_or_else(|| ApiError::NotFound("Patient profile not found".into()))
}

#[derive(Serialize)]
pub struct InviteResponse {
    pub id: Uuid,
    /// Plaintext invite code — returned only at issuance.
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl From<CaregiverInvite> for InviteResponse {
    fn from(invite: CaregiverInvite) -> Self {
        Self {
            id: invite.id,
            code: invite.code,
            expires_at: invite.expires_at,
        }
    }
}

/// `POST /api/invites` — issue a fresh invite for the caller's profile.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<(StatusCode, Json<InviteResponse>), ApiError> {
    let profile_id = own_profile_id(&caller)?;

    let conn = ctx.lock_db()?;
    let invite = invites::issue_invite(&conn, &profile_id, Utc::now())?;

    tracing::info!(invite_id = %invite.id, profile_id = %profile_id, "caregiver invite issued");

    Ok((StatusCode::CREATED, Json(invite.into())))
}

#[derive(Serialize)]
pub struct InviteListResponse {
    pub invites: Vec<InviteResponse>,
}

/// `GET /api/invites` — the caller's pending (unused, unexpired) invites.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<InviteListResponse>, ApiError> {
    let profile_id = own_profile_id(&caller)?;

    let conn = ctx.lock_db()?;
    let invites = list_pending_invites(&conn, &profile_id, Utc::now())?
        .into_iter()
        .map(InviteResponse::from)
        .collect();
    Ok(Json(InviteListResponse { invites }))
}

/// `DELETE /api/invites/:id` — cancel an unused invite.
pub async fn cancel(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path(invite_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let profile_id = own_profile_id(&caller)?;
    let invite_id = parse_uuid_param("invite ID", &invite_id)?;

    let conn = ctx.lock_db()?;
    if !crate::db::repository::delete_invite(&conn, &invite_id, &profile_id)? {
        return Err(ApiError::NotFound("Invite not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedeemRequest {
    pub code: String,
}

#[derive(Serialize)]
pub struct RedeemResponse {
    pub patient_profile_id: Uuid,
    pub patient_name: String,
    pub level: PermissionLevel,
}

/// `POST /api/invites/redeem` — caregiver redeems a code.
///
/// The role gate runs before the code lookup, so a patient probing
/// codes learns nothing about their existence.
pub async fn redeem(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<RedeemRequest>,
) -> Result<Json<RedeemResponse>, ApiError> {
    if !caller.is_caregiver() {
        return Err(ApiError::Forbidden);
    }
    require_field("code", &request.code)?;

    let mut conn = ctx.lock_db()?;
    let redemption =
        invites::redeem_invite(&mut conn, &caller.user_id, &request.code, Utc::now())?;

    tracing::info!(
        caregiver_id = %caller.user_id,
        profile_id = %redemption.permission.patient_profile_id,
        level = redemption.permission.level.as_str(),
        "invite redeemed"
    );

    Ok(Json(RedeemResponse {
        patient_profile_id: redemption.permission.patient_profile_id,
        patient_name: redemption.patient_name,
        level: redemption.permission.level,
    }))
}
