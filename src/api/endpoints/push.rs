//! Web Push subscription storage. The server never sends
//! notifications itself; it only keeps the endpoints a worker would
//! deliver to.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::endpoints::require_field;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Caller;
use crate::db::repository::{delete_push_subscription, upsert_push_subscription};
use crate::models::PushSubscription;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscribeRequest {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

/// `POST /api/push/subscriptions` — store or refresh the caller's
/// subscription for this endpoint.
pub async fn subscribe(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<SubscribeRequest>,
) -> Result<StatusCode, ApiError> {
    require_field("endpoint", &request.endpoint)?;
    require_field("p256dh", &request.p256dh)?;
    require_field("auth", &request.auth)?;

    let conn = ctx.lock_db()?;
    upsert_push_subscription(
        &conn,
        &PushSubscription {
            id: Uuid::new_v4(),
            user_id: caller.user_id,
            endpoint: request.endpoint,
            p256dh_key: request.p256dh,
            auth_key: request.auth,
            created_at: Utc::now(),
        },
    )?;

    Ok(StatusCode::CREATED)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

/// `DELETE /api/push/subscriptions` — remove the caller's subscription
/// for this endpoint.
pub async fn unsubscribe(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<UnsubscribeRequest>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.lock_db()?;
    if !delete_push_subscription(&conn, &caller.user_id, &request.endpoint)? {
        return Err(ApiError::NotFound("Subscription not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
