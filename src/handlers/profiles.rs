use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::{ProfileUpdate, UserProfile};
use crate::state::AppState;

// GET /api/profiles/:uid
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.profiles.get(&uid)?))
}

// PUT /api/profiles/:uid
pub async fn put_profile(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Value>, AppError> {
    let profile = state.profiles.update(&uid, update)?;
    Ok(Json(json!({ "success": true, "profile": profile })))
}
