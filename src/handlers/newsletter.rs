use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::{Field, Locale};
use crate::services::form::validate_field;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
    pub locale: Option<String>,
}

// POST /api/newsletter
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubscribeRequest>,
) -> Result<Json<Value>, AppError> {
    if let Some(msg) = validate_field(Field::Email, &req.email, true) {
        return Err(AppError::validation("email", msg));
    }
    let email = req.email.trim();
    let locale = req
        .locale
        .as_deref()
        .and_then(Locale::parse)
        .unwrap_or(state.config.default_locale);

    tokio::time::timeout(
        state.config.service_timeout,
        state.newsletter.subscribe(email, locale.as_str()),
    )
    .await
    .map_err(|_| AppError::ServiceUnavailable("newsletter signup timed out".to_string()))?
    .map_err(|e| AppError::ServiceUnavailable(format!("newsletter signup failed: {e:#}")))?;

    tracing::info!(locale = locale.as_str(), "newsletter signup");
    Ok(Json(json!({
        "success": true,
        "message": "Thanks for subscribing!",
    })))
}
