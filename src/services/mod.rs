pub mod auth;
pub mod availability;
pub mod bookings;
pub mod calendar;
pub mod contact;
pub mod context;
pub mod email;
pub mod form;
pub mod newsletter;
pub mod preferences;
pub mod profiles;
pub mod sanitize;
pub mod testimonials;

use std::time::Duration;

/// Shared outbound client; every provider call is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default HTTP client");
            reqwest::Client::new()
        })
}
