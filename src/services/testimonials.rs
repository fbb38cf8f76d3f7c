use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Timelike, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::testimonial::sample_testimonials;
use crate::models::{NewTestimonial, ServiceLabel, Testimonial, TestimonialFilter};
use crate::services::availability::lock_db;
use crate::services::form::validate_content_length;
use crate::services::sanitize::sanitize_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestimonialSource {
    Store,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestimonialList {
    pub source: TestimonialSource,
    pub items: Vec<Testimonial>,
}

#[derive(Clone)]
pub struct TestimonialService {
    db: Arc<Mutex<Connection>>,
    timeout: Duration,
}

impl TestimonialService {
    pub fn new(db: Arc<Mutex<Connection>>, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    /// Never fails: a slow, broken or empty store serves the built-in set.
    pub async fn list(&self, filter: &TestimonialFilter) -> TestimonialList {
        let db = self.db.clone();
        let load = tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
            queries::list_visible_testimonials(&conn)
        });

        let stored = match tokio::time::timeout(self.timeout, load).await {
            Ok(Ok(Ok(items))) if !items.is_empty() => Some(items),
            Ok(Ok(Ok(_))) => {
                tracing::debug!("no stored testimonials, serving samples");
                None
            }
            Ok(Ok(Err(e))) => {
                tracing::warn!(error = %e, "testimonial query failed, serving samples");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "testimonial task failed, serving samples");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout = ?self.timeout,
                    "testimonial query timed out, serving samples"
                );
                None
            }
        };

        match stored {
            Some(items) => TestimonialList {
                source: TestimonialSource::Store,
                items: filter.apply(items),
            },
            None => TestimonialList {
                source: TestimonialSource::Fallback,
                items: filter.apply(sample_testimonials()),
            },
        }
    }

    pub fn create(&self, new: NewTestimonial) -> Result<Testimonial, AppError> {
        let client_name = sanitize_text(&new.client_name);
        if client_name.is_empty() {
            return Err(AppError::validation("client_name", "Name is required"));
        }
        if !(1..=5).contains(&new.rating) {
            return Err(AppError::validation(
                "rating",
                "Rating must be between 1 and 5",
            ));
        }
        let content = sanitize_text(&new.content);
        if let Some(msg) = validate_content_length(&content) {
            return Err(AppError::validation("content", msg));
        }
        let service = ServiceLabel::parse(&new.service)
            .ok_or_else(|| AppError::validation("service", "Please select a valid service"))?;

        let now = Utc::now().naive_utc();
        let now = now.with_nanosecond(0).unwrap_or(now);
        let testimonial = Testimonial {
            id: uuid::Uuid::new_v4().to_string(),
            client_name,
            client_age: new.client_age,
            client_location: new
                .client_location
                .map(|l| sanitize_text(&l))
                .filter(|l| !l.is_empty()),
            rating: new.rating,
            content,
            kind: new.kind,
            tags: new
                .tags
                .iter()
                .map(|t| sanitize_text(t).to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            service: service.as_str().to_string(),
            video_id: new.video_id,
            before_after: new.before_after,
            results: new.results,
            is_visible: true,
            is_featured: new.is_featured,
            created_at: now,
            published_at: Some(now),
        };

        let conn = lock_db(&self.db)?;
        queries::insert_testimonial(&conn, &testimonial).map_err(|e| {
            tracing::error!(error = %e, "failed to store testimonial");
            AppError::Unexpected(e)
        })?;
        tracing::info!(id = %testimonial.id, rating = testimonial.rating, "testimonial created");
        Ok(testimonial)
    }
}
