use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::models::{NewTestimonial, TestimonialFilter};
use crate::services::testimonials::TestimonialList;
use crate::state::AppState;

// GET /api/testimonials?kind=&min_rating=&tag=&featured=&service=&sort=&limit=
pub async fn list_testimonials(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TestimonialFilter>,
) -> Json<TestimonialList> {
    Json(state.testimonials.list(&filter).await)
}

// POST /api/admin/testimonials
pub async fn create_testimonial(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(new): Json<NewTestimonial>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let testimonial = state.testimonials.create(new)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "testimonial": testimonial })),
    ))
}
