use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::ContactForm;
use crate::state::AppState;

// POST /api/contact
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    Json(form): Json<ContactForm>,
) -> Result<Json<Value>, AppError> {
    let receipt = state.contact.submit(form).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Thank you! Your message has been sent.",
        "message_id": receipt.message_id,
    })))
}
