//! Authentication endpoints: registration, login, logout, password change.
//!
//! `POST /api/auth/register` and `POST /api/auth/login` are the only
//! unauthenticated mutation endpoints; both issue a session token.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionToken};
use crate::auth::{password, session, Caller};
use crate::db::repository::{get_user, get_user_by_email, insert_user, update_user_password};
use crate::models::enums::Role;
use crate::models::{PublicUser, User};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let at = email.find('@');
    let valid = match at {
        Some(pos) => {
            pos > 0 && email[pos + 1..].contains('.') && !email.ends_with('.') && email.len() <= 254
        }
        None => false,
    };
    if !valid {
        return Err(ApiError::Validation("A valid email address is required".into()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// `POST /api/auth/register` — create an account and issue a session.
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = normalize_email(&request.email);
    validate_email(&email)?;
    validate_password(&request.password)?;

    let password_hash = password::hash_password(&request.password)
        .map_err(|e| ApiError::Internal(format!("password hash: {e}")))?;

    let conn = ctx.lock_db()?;

    if get_user_by_email(&conn, &email)?.is_some() {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let user = User {
        id: Uuid::new_v4(),
        email,
        password_hash,
        role: request.role,
        created_at: Utc::now(),
    };
    // UNIQUE(email) is the backstop for a registration race
    insert_user(&conn, &user).map_err(|e| {
        if e.is_constraint_violation() {
            ApiError::Conflict("Email already registered".into())
        } else {
            e.into()
        }
    })?;

    let token = session::issue_session(&conn, &user.id, Utc::now())?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "account registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.public(),
        }),
    ))
}

/// `POST /api/auth/login` — verify credentials and issue a session.
///
/// Unknown email and wrong password produce the same outcome.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = normalize_email(&request.email);

    let conn = ctx.lock_db()?;

    let user = get_user_by_email(&conn, &email)?.ok_or(ApiError::InvalidCredentials)?;
    if !password::verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let token = session::issue_session(&conn, &user.id, Utc::now())?;

    Ok(Json(AuthResponse {
        token,
        user: user.public(),
    }))
}

/// `POST /api/auth/logout` — revoke the presenting session.
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(token): Extension<SessionToken>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.lock_db()?;
    session::revoke_session(&conn, &token.0)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// `POST /api/auth/password` — change the caller's password.
pub async fn change_password(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    validate_password(&request.new_password)?;

    let conn = ctx.lock_db()?;

    let user = get_user(&conn, &caller.user_id)?.ok_or(ApiError::Unauthorized)?;
    if !password::verify_password(&request.current_password, &user.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let password_hash = password::hash_password(&request.new_password)
        .map_err(|e| ApiError::Internal(format!("password hash: {e}")))?;
    update_user_password(&conn, &user.id, &password_hash)?;

    Ok(StatusCode::NO_CONTENT)
}
