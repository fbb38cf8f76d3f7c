use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::handlers::{caller_uid, check_auth};
use crate::models::{Booking, BookingPatch, ListOptions, NewBooking, Page};
use crate::state::AppState;

// Someone else's booking answers like a missing one.
fn ensure_owner(caller: Option<&str>, booking: &Booking) -> Result<(), AppError> {
    match caller {
        Some(uid) if uid != booking.user_id => Err(AppError::NotFound("booking".to_string())),
        _ => Ok(()),
    }
}

async fn owned_booking(
    state: &AppState,
    headers: &HeaderMap,
    id: &str,
) -> Result<Booking, AppError> {
    let caller = caller_uid(state, headers).await?;
    let booking = state.bookings.get_by_id(id)?;
    ensure_owner(caller.as_deref(), &booking)?;
    Ok(booking)
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(mut new): Json<NewBooking>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if let Some(uid) = caller_uid(&state, &headers).await? {
        let requested = new.user_id.trim();
        if !requested.is_empty() && requested != uid {
            return Err(AppError::Unauthorized);
        }
        new.user_id = uid;
    }
    let booking = state.bookings.create(new)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "booking": booking })),
    ))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(owned_booking(&state, &headers, &id).await?))
}

// PATCH /api/bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<BookingPatch>,
) -> Result<Json<Value>, AppError> {
    owned_booking(&state, &headers, &id).await?;
    let booking = state.bookings.update(&id, patch)?;
    Ok(Json(json!({ "success": true, "booking": booking })))
}

#[derive(Deserialize, Default)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Option<Json<CancelRequest>>,
) -> Result<Json<Value>, AppError> {
    owned_booking(&state, &headers, &id).await?;
    let Json(req) = body.unwrap_or_default();
    let booking = state.bookings.cancel(&id, req.reason.as_deref())?;
    Ok(Json(json!({ "success": true, "booking": booking })))
}

// POST /api/bookings/:id/confirm
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let booking = state.bookings.confirm(&id)?;
    Ok(Json(json!({ "success": true, "booking": booking })))
}

// POST /api/bookings/:id/complete
pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let booking = state.bookings.complete(&id)?;
    Ok(Json(json!({ "success": true, "booking": booking })))
}

// GET /api/users/:user_id/bookings?status=&limit=&order_by=&direction=
pub async fn list_user_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Query(opts): Query<ListOptions>,
) -> Result<Json<Page<Booking>>, AppError> {
    if let Some(uid) = caller_uid(&state, &headers).await? {
        if uid != user_id {
            return Err(AppError::Unauthorized);
        }
    }
    Ok(Json(state.bookings.list_for_user(&user_id, &opts)?))
}
