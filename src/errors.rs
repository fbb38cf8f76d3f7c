use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::Field;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("form has {} invalid field(s)", .0.len())]
    InvalidForm(BTreeMap<Field, String>),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::InvalidForm(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Config(_) | AppError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to the visitor. Internal failures collapse to a
    /// generic text; the detail goes to the log instead.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation { message, .. } => message.clone(),
            AppError::InvalidForm(_) => "Please correct the highlighted fields".to_string(),
            AppError::NotFound(what) => format!("{what} not found"),
            AppError::Conflict(msg) => msg.clone(),
            AppError::ServiceUnavailable(_) => {
                "The service is temporarily unavailable. Please try again later.".to_string()
            }
            AppError::Unauthorized => "unauthorized".to_string(),
            AppError::Database(_) | AppError::Config(_) | AppError::Unexpected(_) => {
                "Something went wrong".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        // Some providers carry their key in the query string.
        let e = e.without_url();
        if e.is_timeout() {
            AppError::ServiceUnavailable(format!("request timed out: {e}"))
        } else {
            AppError::ServiceUnavailable(e.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::Validation { field, message } => {
                tracing::debug!(field, message = %message, "validation failed");
            }
            AppError::InvalidForm(errors) => {
                tracing::debug!(fields = errors.len(), "form validation failed");
            }
            AppError::NotFound(_) | AppError::Conflict(_) | AppError::Unauthorized => {}
            AppError::ServiceUnavailable(detail) => {
                tracing::warn!(detail = %detail, "upstream service unavailable");
            }
            _ => tracing::error!(error = %self, "request failed"),
        }

        let mut body = serde_json::json!({
            "success": false,
            "message": self.public_message(),
        });
        match &self {
            AppError::Validation { field, .. } => {
                body["field"] = serde_json::Value::from(*field);
            }
            AppError::InvalidForm(errors) => {
                body["errors"] = errors
                    .iter()
                    .map(|(field, msg)| {
                        (field.as_str().to_string(), serde_json::Value::from(msg.as_str()))
                    })
                    .collect::<serde_json::Map<_, _>>()
                    .into();
            }
            _ => {}
        }

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = AppError::Unexpected(anyhow::anyhow!("db file locked at /var/lib/x"));
        assert_eq!(err.public_message(), "Something went wrong");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_keeps_message() {
        let err = AppError::validation("email", "Email is required");
        assert_eq!(err.public_message(), "Email is required");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::NotFound("booking".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("taken".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::ServiceUnavailable("timeout".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
