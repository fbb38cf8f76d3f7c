pub mod auth;
pub mod availability;
pub mod bookings;
pub mod calendar;
pub mod contact;
pub mod health;
pub mod newsletter;
pub mod preferences;
pub mod profiles;
pub mod site;
pub mod testimonials;

use std::any::Any;
use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::catch_panic::CatchPanicLayer;

use crate::errors::AppError;
use crate::state::AppState;

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

/// Bearer-token guard for coach/admin operations.
pub(crate) fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    match bearer(headers) {
        Some(token) if token == expected_token => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}

/// Uid of the user acting on per-user records. `None` means no ownership
/// check applies: auth is disabled or the admin token was presented.
pub(crate) async fn caller_uid(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<String>, AppError> {
    let Some(auth) = &state.auth else {
        return Ok(None);
    };
    let token = bearer(headers).ok_or(AppError::Unauthorized)?;
    if token == state.config.admin_token {
        return Ok(None);
    }
    let identity = auth.verify_id_token(token).await?;
    Ok(Some(identity.uid))
}

/// Last-resort boundary: a panicking handler still answers with the regular
/// error envelope plus the actions the page can offer.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "success": false,
            "message": "Something went wrong",
            "actions": ["retry", "reload"],
        })),
    )
        .into_response()
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/site", get(site::site_info))
        .route("/api/availability", get(availability::get_availability))
        .route("/api/bookings", post(bookings::create_booking))
        .route(
            "/api/bookings/:id",
            get(bookings::get_booking).patch(bookings::update_booking),
        )
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/api/bookings/:id/confirm", post(bookings::confirm_booking))
        .route(
            "/api/bookings/:id/complete",
            post(bookings::complete_booking),
        )
        .route(
            "/api/users/:user_id/bookings",
            get(bookings::list_user_bookings),
        )
        .route("/api/contact", post(contact::submit_contact))
        .route("/api/newsletter", post(newsletter::subscribe))
        .route("/api/testimonials", get(testimonials::list_testimonials))
        .route(
            "/api/admin/testimonials",
            post(testimonials::create_testimonial),
        )
        .route(
            "/api/preferences/:user_id",
            get(preferences::get_preferences).put(preferences::put_preferences),
        )
        .route(
            "/api/profiles/:uid",
            get(profiles::get_profile).put(profiles::put_profile),
        )
        .route("/api/auth/sign-up", post(auth::sign_up))
        .route("/api/auth/sign-in", post(auth::sign_in))
        .route("/api/auth/password-reset", post(auth::password_reset))
        .route("/calendar/:booking_id", get(calendar::download_ics))
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}
