use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub coach_id: String,
    pub service: String,
    pub date_time: NaiveDateTime,
    pub duration_minutes: u32,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn end_time(&self) -> NaiveDateTime {
        self.date_time + Duration::minutes(self.duration_minutes as i64)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            "completed" => BookingStatus::Completed,
            _ => BookingStatus::Pending,
        }
    }

    /// Whether a booking in this status occupies its time window.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

/// Input for creating a booking; id, status and timestamps are assigned by
/// the repository.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    /// Filled from the caller's identity when auth is enabled.
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub coach_id: Option<String>,
    pub service: String,
    pub date_time: NaiveDateTime,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_duration() -> u32 {
    crate::models::availability::DEFAULT_DURATION_MINUTES
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingPatch {
    pub service: Option<String>,
    pub date_time: Option<NaiveDateTime>,
    pub duration_minutes: Option<u32>,
    pub status: Option<BookingStatus>,
    pub notes: Option<String>,
}

impl BookingPatch {
    pub fn moves_window(&self) -> bool {
        self.date_time.is_some() || self.duration_minutes.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    #[default]
    DateTime,
    CreatedAt,
}

impl OrderBy {
    pub fn column(&self) -> &'static str {
        match self {
            OrderBy::DateTime => "date_time",
            OrderBy::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

impl Direction {
    pub fn keyword(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListOptions {
    pub status: Option<BookingStatus>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub order_by: OrderBy,
    #[serde(default)]
    pub direction: Direction,
}

impl ListOptions {
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}
