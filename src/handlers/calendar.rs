use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::errors::AppError;
use crate::services::calendar::generate_ics;
use crate::state::AppState;

// GET /calendar/:booking_id(.ics)
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let booking_id = raw_id.strip_suffix(".ics").unwrap_or(&raw_id);
    let booking = state.bookings.get_by_id(booking_id)?;

    let coach_name = {
        let profile = state.profiles.get(&booking.coach_id).ok();
        profile
            .map(|p| p.display_name())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "your coach".to_string())
    };

    let ics = generate_ics(&booking, &coach_name);
    let filename = format!("booking-{booking_id}.ics");

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}
