use std::sync::{Arc, Mutex};

use chrono::{NaiveDateTime, Timelike, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    Booking, BookingPatch, BookingStatus, ListOptions, NewBooking, Page, ServiceLabel,
};
use crate::services::availability::{lock_db, AvailabilityResolver};

/// Requested start times within this many seconds of an open slot are
/// accepted and snapped onto the slot.
pub const SLOT_TOLERANCE_SECS: i64 = 60;

// Stored timestamps have second precision.
fn whole_seconds(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(0).unwrap_or(dt)
}

fn store_err(e: anyhow::Error) -> AppError {
    AppError::ServiceUnavailable(format!("booking store: {e}"))
}

/// Persistence for bookings. Availability is re-checked on every write while
/// the store lock is held, so of two racing requests for one window only
/// the first is stored.
#[derive(Clone)]
pub struct BookingRepository {
    db: Arc<Mutex<Connection>>,
    availability: AvailabilityResolver,
    default_coach_id: String,
}

impl BookingRepository {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        availability: AvailabilityResolver,
        default_coach_id: String,
    ) -> Self {
        Self {
            db,
            availability,
            default_coach_id,
        }
    }

    pub fn create(&self, new: NewBooking) -> Result<Booking, AppError> {
        self.create_at(new, Utc::now().naive_utc())
    }

    pub fn create_at(&self, new: NewBooking, now: NaiveDateTime) -> Result<Booking, AppError> {
        let now = whole_seconds(now);
        if new.user_id.trim().is_empty() {
            return Err(AppError::validation("user_id", "A signed-in user is required"));
        }
        let service = ServiceLabel::parse(&new.service)
            .ok_or_else(|| AppError::validation("service", "Please select a valid service"))?;
        check_window(new.date_time, new.duration_minutes, now)?;

        let coach_id = new
            .coach_id
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.default_coach_id.clone());

        let conn = lock_db(&self.db)?;
        let slot = self.claim_slot(&conn, &coach_id, new.date_time, new.duration_minutes, None)?;

        let booking = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new.user_id.trim().to_string(),
            coach_id,
            service: service.as_str().to_string(),
            date_time: slot,
            duration_minutes: new.duration_minutes,
            status: BookingStatus::Pending,
            notes: new.notes.filter(|n| !n.trim().is_empty()),
            created_at: now,
            updated_at: now,
        };
        queries::create_booking(&conn, &booking).map_err(store_err)?;

        tracing::info!(
            booking_id = %booking.id,
            coach_id = %booking.coach_id,
            date_time = %booking.date_time,
            "booking created"
        );
        Ok(booking)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Booking, AppError> {
        let conn = lock_db(&self.db)?;
        fetch(&conn, id)
    }

    pub fn list_for_user(
        &self,
        user_id: &str,
        opts: &ListOptions,
    ) -> Result<Page<Booking>, AppError> {
        let conn = lock_db(&self.db)?;
        queries::list_bookings_for_user(&conn, user_id, opts).map_err(store_err)
    }

    pub fn update(&self, id: &str, patch: BookingPatch) -> Result<Booking, AppError> {
        self.update_at(id, patch, Utc::now().naive_utc())
    }

    pub fn update_at(
        &self,
        id: &str,
        patch: BookingPatch,
        now: NaiveDateTime,
    ) -> Result<Booking, AppError> {
        if patch.status.is_some() {
            return Err(AppError::validation(
                "status",
                "Use the cancel, confirm or complete endpoints to change status",
            ));
        }

        let now = whole_seconds(now);
        let conn = lock_db(&self.db)?;
        let mut booking = fetch(&conn, id)?;

        if let Some(service) = &patch.service {
            let label = ServiceLabel::parse(service)
                .ok_or_else(|| AppError::validation("service", "Please select a valid service"))?;
            booking.service = label.as_str().to_string();
        }
        if patch.moves_window() {
            let date_time = patch.date_time.unwrap_or(booking.date_time);
            let duration = patch.duration_minutes.unwrap_or(booking.duration_minutes);
            check_window(date_time, duration, now)?;
            booking.date_time =
                self.claim_slot(&conn, &booking.coach_id, date_time, duration, Some(id))?;
            booking.duration_minutes = duration;
        }
        if let Some(notes) = patch.notes {
            booking.notes = Some(notes).filter(|n| !n.trim().is_empty());
        }
        booking.updated_at = now;

        if !queries::save_booking(&conn, &booking).map_err(store_err)? {
            return Err(AppError::NotFound("booking".to_string()));
        }
        Ok(booking)
    }

    /// Marks the booking cancelled and records the reason in its notes.
    /// Cancelling an already-cancelled booking is a no-op; a completed one
    /// cannot be cancelled.
    pub fn cancel(&self, id: &str, reason: Option<&str>) -> Result<Booking, AppError> {
        let conn = lock_db(&self.db)?;
        let mut booking = fetch(&conn, id)?;
        if booking.status == BookingStatus::Cancelled {
            return Ok(booking);
        }
        if !booking.status.is_active() {
            return Err(AppError::validation(
                "status",
                format!("A {} booking cannot be cancelled", booking.status.as_str()),
            ));
        }

        booking.status = BookingStatus::Cancelled;
        if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
            let line = format!("Cancellation reason: {reason}");
            booking.notes = Some(match booking.notes.take() {
                Some(existing) if !existing.is_empty() => format!("{existing}\n{line}"),
                _ => line,
            });
        }
        booking.updated_at = whole_seconds(Utc::now().naive_utc());
        queries::save_booking(&conn, &booking).map_err(store_err)?;

        tracing::info!(booking_id = %booking.id, "booking cancelled");
        Ok(booking)
    }

    pub fn confirm(&self, id: &str) -> Result<Booking, AppError> {
        self.transition(id, BookingStatus::Confirmed)
    }

    pub fn complete(&self, id: &str) -> Result<Booking, AppError> {
        self.transition(id, BookingStatus::Completed)
    }

    fn transition(&self, id: &str, to: BookingStatus) -> Result<Booking, AppError> {
        let conn = lock_db(&self.db)?;
        let booking = fetch(&conn, id)?;
        if booking.status == to {
            return Ok(booking);
        }
        if !booking.status.is_active() {
            return Err(AppError::validation(
                "status",
                format!(
                    "A {} booking cannot be marked {}",
                    booking.status.as_str(),
                    to.as_str()
                ),
            ));
        }

        queries::update_booking_status(&conn, id, &to).map_err(store_err)?;
        let updated = fetch(&conn, id)?;
        tracing::info!(booking_id = %id, status = to.as_str(), "booking status changed");
        Ok(updated)
    }

    fn claim_slot(
        &self,
        conn: &Connection,
        coach_id: &str,
        date_time: NaiveDateTime,
        duration_minutes: u32,
        exclude_id: Option<&str>,
    ) -> Result<NaiveDateTime, AppError> {
        let slots = self.availability.slots_with(
            conn,
            coach_id,
            date_time.date(),
            Some(duration_minutes),
            exclude_id,
        )?;

        slots
            .into_iter()
            .find(|slot| (*slot - date_time).num_seconds().abs() <= SLOT_TOLERANCE_SECS)
            .ok_or_else(|| {
                AppError::Conflict(
                    "Sorry, that time slot is no longer available. Please pick a different time."
                        .to_string(),
                )
            })
    }
}

fn fetch(conn: &Connection, id: &str) -> Result<Booking, AppError> {
    queries::get_booking_by_id(conn, id)
        .map_err(store_err)?
        .ok_or_else(|| AppError::NotFound("booking".to_string()))
}

fn check_window(
    date_time: NaiveDateTime,
    duration_minutes: u32,
    now: NaiveDateTime,
) -> Result<(), AppError> {
    if date_time <= now {
        return Err(AppError::validation(
            "date_time",
            "Booking time must be in the future",
        ));
    }
    if duration_minutes == 0 {
        return Err(AppError::validation(
            "duration_minutes",
            "Duration must be at least 1 minute",
        ));
    }
    Ok(())
}
