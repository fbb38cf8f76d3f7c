use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::{Field, ProfileUpdate};
use crate::services::auth::AuthProvider;
use crate::services::form::validate_field;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub email: String,
}

fn provider(state: &AppState) -> Result<&Arc<dyn AuthProvider>, AppError> {
    state
        .auth
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Authentication".to_string()))
}

fn check_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if let Some(msg) = validate_field(Field::Email, email, true) {
        return Err(AppError::validation("email", msg));
    }
    if password.is_empty() {
        return Err(AppError::validation("password", "Password is required"));
    }
    Ok(())
}

// POST /api/auth/sign-up
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let auth = provider(&state)?;
    let email = req.email.trim();
    check_credentials(email, &req.password)?;

    let grant = auth.sign_up(email, &req.password).await?;
    let profile = state.profiles.update(
        &grant.identity.uid,
        ProfileUpdate {
            first_name: req.first_name,
            last_name: req.last_name,
        },
    )?;

    // Best-effort once the account exists.
    if let Err(e) = auth.send_email_verification(&grant.id_token).await {
        tracing::warn!(error = %e, uid = %grant.identity.uid, "verification email not sent");
    }

    tracing::info!(uid = %grant.identity.uid, "account created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": grant.identity,
            "profile": profile,
            "id_token": grant.id_token,
        })),
    ))
}

// POST /api/auth/sign-in
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Credentials>,
) -> Result<Json<Value>, AppError> {
    let auth = provider(&state)?;
    let email = req.email.trim();
    check_credentials(email, &req.password)?;

    let grant = auth.sign_in(email, &req.password).await?;
    Ok(Json(json!({
        "success": true,
        "user": grant.identity,
        "id_token": grant.id_token,
    })))
}

// POST /api/auth/password-reset
// Unknown addresses get the same answer as known ones.
pub async fn password_reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetRequest>,
) -> Result<Json<Value>, AppError> {
    let auth = provider(&state)?;
    let email = req.email.trim();
    if let Some(msg) = validate_field(Field::Email, email, true) {
        return Err(AppError::validation("email", msg));
    }

    match auth.send_password_reset(email).await {
        Ok(()) | Err(AppError::Unauthorized) => {}
        Err(e) => return Err(e),
    }
    Ok(Json(json!({
        "success": true,
        "message": "If an account exists for this address, a reset link is on its way.",
    })))
}
