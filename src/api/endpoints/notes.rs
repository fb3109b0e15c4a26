//! Medical note endpoints, scoped by patient profile.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{check_profile_access, AccessAction};
use crate::api::endpoints::{parse_uuid_param, require_field};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Caller;
use crate::db::repository::{delete_note, get_note, insert_note, list_notes, update_note};
use crate::models::Note;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoteRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub pinned: bool,
}

#[derive(Serialize)]
pub struct NoteListResponse {
    pub notes: Vec<Note>,
}

/// `GET /api/patients/:profile_id/notes`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path(profile_id): Path<String>,
) -> Result<Json<NoteListResponse>, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Read)?;

    let notes = list_notes(&conn, &profile_id)?;
    Ok(Json(NoteListResponse { notes }))
}

/// `POST /api/patients/:profile_id/notes`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path(profile_id): Path<String>,
    Json(request): Json<NoteRequest>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    require_field("title", &request.title)?;
    require_field("body", &request.body)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Write)?;

    let now = Utc::now();
    let note = Note {
        id: Uuid::new_v4(),
        patient_profile_id: profile_id,
        title: request.title.trim().to_string(),
        body: request.body,
        pinned: request.pinned,
        created_at: now,
        updated_at: now,
    };
    insert_note(&conn, &note)?;

    Ok((StatusCode::CREATED, Json(note)))
}

/// `GET /api/patients/:profile_id/notes/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path((profile_id, note_id)): Path<(String, String)>,
) -> Result<Json<Note>, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    let note_id = parse_uuid_param("note ID", &note_id)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Read)?;

    let note = get_note(&conn, &note_id, &profile_id)?
        .ok_or_else(|| ApiError::NotFound("Note not found".into()))?;
    Ok(Json(note))
}

/// `PUT /api/patients/:profile_id/notes/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path((profile_id, note_id)): Path<(String, String)>,
    Json(request): Json<NoteRequest>,
) -> Result<Json<Note>, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    let note_id = parse_uuid_param("note ID", &note_id)?;
    require_field("title", &request.title)?;
    require_field("body", &request.body)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Write)?;

    let existing = get_note(&conn, &note_id, &profile_id)?
        .ok_or_else(|| ApiError::NotFound("Note not found".into()))?;

    let note = Note {
        title: request.title.trim().to_string(),
        body: request.body,
        pinned: request.pinned,
        updated_at: Utc::now(),
        ..existing
    };
    update_note(&conn, &note)?;

    Ok(Json(note))
}

/// `DELETE /api/patients/:profile_id/notes/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path((profile_id, note_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    let note_id = parse_uuid_param("note ID", &note_id)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Write)?;

    if !delete_note(&conn, &note_id, &profile_id)? {
        return Err(ApiError::NotFound("Note not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
