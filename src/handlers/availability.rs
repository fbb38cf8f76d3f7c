use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::availability::DEFAULT_DURATION_MINUTES;
use crate::state::AppState;

const MAX_DURATION_MINUTES: u32 = 8 * 60;

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    pub duration: Option<u32>,
    pub coach_id: Option<String>,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    date: NaiveDate,
    coach_id: String,
    duration_minutes: u32,
    slots: Vec<NaiveDateTime>,
}

// GET /api/availability?date=YYYY-MM-DD&duration=60
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let raw_date = query
        .date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::validation("date", "Please select a date"))?;
    let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
        .map_err(|_| AppError::validation("date", "Date must be formatted YYYY-MM-DD"))?;

    let duration = query.duration.unwrap_or(DEFAULT_DURATION_MINUTES);
    if duration == 0 || duration > MAX_DURATION_MINUTES {
        return Err(AppError::validation(
            "duration",
            format!("Duration must be between 1 and {MAX_DURATION_MINUTES} minutes"),
        ));
    }

    let coach_id = query
        .coach_id
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| state.config.coach_id.clone());

    let slots = state
        .availability
        .slots_for(&coach_id, date, Some(duration))?;
    tracing::debug!(%date, coach_id = %coach_id, count = slots.len(), "availability computed");

    Ok(Json(AvailabilityResponse {
        date,
        coach_id,
        duration_minutes: duration,
        slots,
    }))
}
