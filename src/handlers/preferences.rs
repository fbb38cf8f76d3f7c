use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::services::preferences::{PreferencesUpdate, ResolvedPreferences};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub system_theme: Option<String>,
    pub accept_language: Option<String>,
}

// GET /api/preferences/:user_id?system_theme=dark&accept_language=fr-CA
// Without `accept_language` the request's own Accept-Language header is used.
pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<ResolveQuery>,
) -> Json<ResolvedPreferences> {
    let header_languages = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());
    let languages = query.accept_language.as_deref().or(header_languages);

    Json(
        state
            .preferences
            .resolve(Some(&user_id), query.system_theme.as_deref(), languages),
    )
}

// PUT /api/preferences/:user_id
pub async fn put_preferences(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(update): Json<PreferencesUpdate>,
) -> Result<Json<Value>, AppError> {
    let preferences = state.preferences.set(&user_id, update)?;
    Ok(Json(json!({ "success": true, "preferences": preferences })))
}
