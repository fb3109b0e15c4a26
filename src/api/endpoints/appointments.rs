//! Appointment endpoints, scoped by patient profile, plus the
//! month-bucketed calendar view.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{check_profile_access, AccessAction};
use crate::api::endpoints::{parse_uuid_param, require_field};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Caller;
use crate::db::repository::{
    delete_appointment, get_appointment, insert_appointment, list_appointments,
    list_appointments_between, update_appointment,
};
use crate::models::Appointment;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppointmentRequest {
    pub title: String,
    pub location: Option<String>,
    pub clinician: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct AppointmentListResponse {
    pub appointments: Vec<Appointment>,
}

/// `GET /api/patients/:profile_id/appointments`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path(profile_id): Path<String>,
) -> Result<Json<AppointmentListResponse>, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Read)?;

    let appointments = list_appointments(&conn, &profile_id)?;
    Ok(Json(AppointmentListResponse { appointments }))
}

/// `POST /api/patients/:profile_id/appointments`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path(profile_id): Path<String>,
    Json(request): Json<AppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    require_field("title", &request.title)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Write)?;

    let now = Utc::now();
    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_profile_id: profile_id,
        title: request.title.trim().to_string(),
        location: request.location,
        clinician: request.clinician,
        scheduled_at: request.scheduled_at,
        notes: request.notes,
        created_at: now,
        updated_at: now,
    };
    insert_appointment(&conn, &appointment)?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

/// `GET /api/patients/:profile_id/appointments/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path((profile_id, appointment_id)): Path<(String, String)>,
) -> Result<Json<Appointment>, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    let appointment_id = parse_uuid_param("appointment ID", &appointment_id)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Read)?;

    let appointment = get_appointment(&conn, &appointment_id, &profile_id)?
        .ok_or_else(|| ApiError::NotFound("Appointment not found".into()))?;
    Ok(Json(appointment))
}

/// `PUT /api/patients/:profile_id/appointments/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path((profile_id, appointment_id)): Path<(String, String)>,
    Json(request): Json<AppointmentRequest>,
) -> Result<Json<Appointment>, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    let appointment_id = parse_uuid_param("appointment ID", &appointment_id)?;
    require_field("title", &request.title)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Write)?;

    let existing = get_appointment(&conn, &appointment_id, &profile_id)?
        .ok_or_else(|| ApiError::NotFound("Appointment not found".into()))?;

    let appointment = Appointment {
        title: request.title.trim().to_string(),
        location: request.location,
        clinician: request.clinician,
        scheduled_at: request.scheduled_at,
        notes: request.notes,
        updated_at: Utc::now(),
        ..existing
    };
    update_appointment(&conn, &appointment)?;

    Ok(Json(appointment))
}

/// `DELETE /api/patients/:profile_id/appointments/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path((profile_id, appointment_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;
    let appointment_id = parse_uuid_param("appointment ID", &appointment_id)?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Write)?;

    if !delete_appointment(&conn, &appointment_id, &profile_id)? {
        return Err(ApiError::NotFound("Appointment not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct CalendarQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub appointments: Vec<Appointment>,
}

#[derive(Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
}

/// `GET /api/patients/:profile_id/appointments/calendar?year=&month=` —
/// the month's appointments bucketed by day. Days without any are
/// omitted.
pub async fn calendar(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Path(profile_id): Path<String>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>, ApiError> {
    let profile_id = parse_uuid_param("profile ID", &profile_id)?;

    let start = NaiveDate::from_ymd_opt(query.year, query.month, 1)
        .ok_or_else(|| ApiError::Validation("Invalid year/month".into()))?;
    let end = if query.month == 12 {
        NaiveDate::from_ymd_opt(query.year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(query.year, query.month + 1, 1)
    }
    .ok_or_else(|| ApiError::Validation("Invalid year/month".into()))?;

    let conn = ctx.lock_db()?;
    check_profile_access(&conn, &caller, &profile_id, AccessAction::Read)?;

    let appointments = list_appointments_between(
        &conn,
        &profile_id,
        Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN)),
        Utc.from_utc_datetime(&end.and_time(NaiveTime::MIN)),
    )?;

    let mut buckets: BTreeMap<NaiveDate, Vec<Appointment>> = BTreeMap::new();
    for appt in appointments {
        buckets
            .entry(appt.scheduled_at.date_naive())
            .or_default()
            .push(appt);
    }

    Ok(Json(CalendarResponse {
        year: query.year,
        month: query.month,
        days: buckets
            .into_iter()
            .map(|(date, appointments)| CalendarDay { date, appointments })
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_month_bounds() {
        // December rolls into the next year
        let start = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(end.signed_duration_since(start).num_days(), 31);
    }
}
