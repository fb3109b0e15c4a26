//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, verifies the session, and
//! injects a `Caller` (and the raw token, for logout) into request
//! extensions for downstream handlers.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionToken};
use crate::auth::{session, Caller};
use crate::db::repository::{get_profile_by_user, get_user};

/// Require a valid session token.
///
/// Accesses `ApiContext` from request extensions (injected by the
/// Extension layer). On success the request carries a `Caller` with
/// the subject's id, role, and (for patients) their profile id.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    // 1. Extract bearer token
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    // 2. Resolve the session to a caller identity
    let caller = {
        let conn = ctx.lock_db()?;
        let session = session::verify_session(&conn, &token, Utc::now())?;
        let user = get_user(&conn, &session.user_id)?
            .ok_or(ApiError::Unauthorized)?;
        let profile_id = if user.role == crate::models::enums::Role::Patient {
            get_profile_by_user(&conn, &user.id)?.map(|p| p.id)
        } else {
            None
        };
        Caller {
            user_id: user.id,
            role: user.role,
            profile_id,
        }
    }; // MutexGuard dropped here, before any .await

    // 3. Inject caller identity for downstream handlers
    req.extensions_mut().insert(caller);
    req.extensions_mut().insert(SessionToken(token));

    // 4. Process request
    let mut response = next.run(req).await;

    // 5. Responses carry health data — never cache them
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));

    Ok(response)
}
