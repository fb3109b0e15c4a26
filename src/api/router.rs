//! API router.
//!
//! Routes are nested under `/api/`. Everything except the health check
//! and `register`/`login` sits behind the bearer-token auth middleware,
//! which injects the explicit `Caller` identity that every handler and
//! access check consumes.

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the full API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost
/// layer); endpoint handlers use `State<ApiContext>`.
pub fn api_router(ctx: ApiContext) -> Router {
    let public = Router::new()
        .route("/healthz", get(endpoints::health::check))
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx.clone());

    let protected = Router::new()
        .route("/auth/logout", post(endpoints::auth::logout))
        .route("/auth/password", post(endpoints::auth::change_password))
        .route(
            "/profile",
            get(endpoints::profiles::get).put(endpoints::profiles::save),
        )
        .route(
            "/invites",
            get(endpoints::invites::list).post(endpoints::invites::create),
        )
        .route("/invites/redeem", post(endpoints::invites::redeem))
        .route("/invites/:id", delete(endpoints::invites::cancel))
        .route("/caregivers", get(endpoints::caregivers::list))
        .route(
            "/caregivers/:caregiver_id",
            axum::routing::patch(endpoints::caregivers::update_level)
                .delete(endpoints::caregivers::revoke),
        )
        .route("/patients", get(endpoints::patients::list))
        .route(
            "/patients/:profile_id/overview",
            get(endpoints::patients::overview),
        )
        .route(
            "/patients/:profile_id/medications",
            get(endpoints::medications::list).post(endpoints::medications::create),
        )
        .route(
            "/patients/:profile_id/medications/:id",
            get(endpoints::medications::detail)
                .put(endpoints::medications::update)
                .delete(endpoints::medications::remove),
        )
        .route(
            "/patients/:profile_id/appointments",
            get(endpoints::appointments::list).post(endpoints::appointments::create),
        )
        .route(
            "/patients/:profile_id/appointments/calendar",
            get(endpoints::appointments::calendar),
        )
        .route(
            "/patients/:profile_id/appointments/:id",
            get(endpoints::appointments::detail)
                .put(endpoints::appointments::update)
                .delete(endpoints::appointments::remove),
        )
        .route(
            "/patients/:profile_id/treatments",
            get(endpoints::treatments::list).post(endpoints::treatments::create),
        )
        .route(
            "/patients/:profile_id/treatments/:id",
            get(endpoints::treatments::detail)
                .put(endpoints::treatments::update)
                .delete(endpoints::treatments::remove),
        )
        .route(
            "/patients/:profile_id/notes",
            get(endpoints::notes::list).post(endpoints::notes::create),
        )
        .route(
            "/patients/:profile_id/notes/:id",
            get(endpoints::notes::detail)
                .put(endpoints::notes::update)
                .delete(endpoints::notes::remove),
        )
        .route(
            "/push/subscriptions",
            post(endpoints::push::subscribe).delete(endpoints::push::unsubscribe),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so the middleware can extract ApiContext
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", public)
        .nest("/api", protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
