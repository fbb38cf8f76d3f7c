use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::Booking;

pub const DEFAULT_DURATION_MINUTES: u32 = 60;
pub const DEFAULT_GRANULARITY_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl WorkingHours {
    pub fn parse(open: &str, close: &str) -> anyhow::Result<Self> {
        let open = parse_time(open)?;
        let close = parse_time(close)?;
        if open >= close {
            anyhow::bail!("opening time must be before closing time");
        }
        Ok(Self { open, close })
    }

    pub fn to_human_readable(&self) -> String {
        format!("{}-{}", self.open.format("%H:%M"), self.close.format("%H:%M"))
    }
}

#[derive(Debug, Clone)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub granularity_minutes: u32,
    pub hours: WorkingHours,
}

impl SlotQuery {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
            hours: WorkingHours::default(),
        }
    }
}

/// Ordered start times on `query.date` whose `[start, start + duration)`
/// interval fits inside working hours and overlaps no active booking.
pub fn available_slots(query: &SlotQuery, bookings: &[Booking]) -> Vec<NaiveDateTime> {
    if query.duration_minutes == 0 || query.granularity_minutes == 0 {
        return vec![];
    }

    let duration = Duration::minutes(query.duration_minutes as i64);
    let step = Duration::minutes(query.granularity_minutes as i64);
    let close = query.date.and_time(query.hours.close);

    let busy: Vec<(NaiveDateTime, NaiveDateTime)> = bookings
        .iter()
        .filter(|b| b.status.is_active())
        .map(|b| (b.date_time, b.end_time()))
        .collect();

    let mut slots = vec![];
    let mut start = query.date.and_time(query.hours.open);
    while start + duration <= close {
        let end = start + duration;
        let free = busy
            .iter()
            .all(|(b_start, b_end)| !(*b_start < end && *b_end > start));
        if free {
            slots.push(start);
        }
        start += step;
    }
    slots
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| anyhow::anyhow!("invalid time format: {s}"))
}
