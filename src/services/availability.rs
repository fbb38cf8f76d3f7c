use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::availability::{available_slots, SlotQuery, DEFAULT_DURATION_MINUTES};
use crate::models::WorkingHours;

pub fn lock_db(db: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, AppError> {
    db.lock()
        .map_err(|_| AppError::ServiceUnavailable("database lock poisoned".to_string()))
}

/// Computes open start times for a coach from the booking store.
#[derive(Clone)]
pub struct AvailabilityResolver {
    db: Arc<Mutex<Connection>>,
    hours: WorkingHours,
    granularity_minutes: u32,
}

impl AvailabilityResolver {
    pub fn new(db: Arc<Mutex<Connection>>, hours: WorkingHours, granularity_minutes: u32) -> Self {
        Self {
            db,
            hours,
            granularity_minutes,
        }
    }

    pub fn hours(&self) -> WorkingHours {
        self.hours
    }

    /// An empty list means the day is fully booked; a store failure is an
    /// error, never an empty list.
    pub fn slots_for(
        &self,
        coach_id: &str,
        date: NaiveDate,
        duration_minutes: Option<u32>,
    ) -> Result<Vec<NaiveDateTime>, AppError> {
        let conn = lock_db(&self.db)?;
        self.slots_with(&conn, coach_id, date, duration_minutes, None)
    }

    /// Same as `slots_for` on an already-locked connection, optionally
    /// ignoring one booking (the one being rescheduled).
    pub fn slots_with(
        &self,
        conn: &Connection,
        coach_id: &str,
        date: NaiveDate,
        duration_minutes: Option<u32>,
        exclude_id: Option<&str>,
    ) -> Result<Vec<NaiveDateTime>, AppError> {
        let mut bookings = queries::get_active_coach_bookings_on(conn, coach_id, date)
            .map_err(|e| {
                tracing::warn!(error = %e, coach_id, %date, "availability query failed");
                AppError::ServiceUnavailable(format!("availability query failed: {e}"))
            })?;
        if let Some(exclude) = exclude_id {
            bookings.retain(|b| b.id != exclude);
        }

        let query = SlotQuery {
            date,
            duration_minutes: duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            granularity_minutes: self.granularity_minutes,
            hours: self.hours,
        };
        Ok(available_slots(&query, &bookings))
    }
}
