use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{AuthGrant, AuthProvider};
use crate::errors::AppError;
use crate::models::AuthIdentity;

const IDENTITY_TOOLKIT: &str = "https://identitytoolkit.googleapis.com/v1";

/// Firebase Authentication over the Identity Toolkit REST API.
pub struct FirebaseAuth {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

impl FirebaseAuth {
    pub fn new(api_key: String, client: reqwest::Client) -> Self {
        Self {
            api_key,
            endpoint: IDENTITY_TOOLKIT.to_string(),
            client,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn call(&self, method: &str, body: Value) -> Result<Value, AppError> {
        let url = format!("{}/accounts:{method}?key={}", self.endpoint, self.api_key);
        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        let payload: Value = resp.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(payload);
        }
        let code = payload["error"]["message"].as_str().unwrap_or_default();
        tracing::debug!(method, %status, code, "identity toolkit rejected request");
        Err(map_error_code(code, status))
    }

    async fn grant(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthGrant, AppError> {
        let payload = self
            .call(
                method,
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        let token: TokenResponse = serde_json::from_value(payload)
            .map_err(|e| AppError::ServiceUnavailable(format!("unexpected auth response: {e}")))?;

        let email_verified = match self.lookup(&token.id_token).await {
            Ok(user) => user.email_verified,
            Err(e) => {
                tracing::warn!(error = %e, "could not look up verification status");
                false
            }
        };

        Ok(AuthGrant {
            identity: AuthIdentity {
                uid: token.local_id,
                email: if token.email.is_empty() {
                    email.to_string()
                } else {
                    token.email
                },
                display_name: token.display_name.filter(|n| !n.is_empty()),
                email_verified,
            },
            id_token: token.id_token,
        })
    }

    async fn lookup(&self, id_token: &str) -> Result<LookupUser, AppError> {
        let payload = self.call("lookup", json!({ "idToken": id_token })).await?;
        let lookup: LookupResponse = serde_json::from_value(payload)
            .map_err(|e| AppError::ServiceUnavailable(format!("unexpected lookup response: {e}")))?;
        lookup.users.into_iter().next().ok_or(AppError::Unauthorized)
    }
}

/// Error codes come back as e.g. `EMAIL_EXISTS` or
/// `WEAK_PASSWORD : Password should be at least 6 characters`.
fn map_error_code(code: &str, status: reqwest::StatusCode) -> AppError {
    let key = code.split(':').next().unwrap_or_default().trim();
    match key {
        "EMAIL_EXISTS" => {
            AppError::Conflict("An account with this email already exists".to_string())
        }
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AppError::Unauthorized
        }
        "INVALID_EMAIL" | "MISSING_EMAIL" => {
            AppError::validation("email", "Please enter a valid email address")
        }
        "WEAK_PASSWORD" | "MISSING_PASSWORD" => {
            AppError::validation("password", "Password should be at least 6 characters")
        }
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" => AppError::Unauthorized,
        _ => AppError::ServiceUnavailable(format!("identity toolkit returned {status}: {code}")),
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthGrant, AppError> {
        self.grant("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthGrant, AppError> {
        self.grant("signInWithPassword", email, password).await
    }

    // ID tokens are self-contained; there is nothing to revoke server side.
    async fn sign_out(&self, _grant: &AuthGrant) -> Result<(), AppError> {
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AppError> {
        self.call(
            "sendOobCode",
            json!({ "requestType": "PASSWORD_RESET", "email": email }),
        )
        .await?;
        Ok(())
    }

    async fn send_email_verification(&self, id_token: &str) -> Result<(), AppError> {
        self.call(
            "sendOobCode",
            json!({ "requestType": "VERIFY_EMAIL", "idToken": id_token }),
        )
        .await?;
        Ok(())
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<AuthIdentity, AppError> {
        let user = self.lookup(id_token).await?;
        Ok(AuthIdentity {
            uid: user.local_id,
            email: user.email,
            display_name: user.display_name.filter(|n| !n.is_empty()),
            email_verified: user.email_verified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_error_codes() {
        assert!(matches!(
            map_error_code("EMAIL_EXISTS", StatusCode::BAD_REQUEST),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            map_error_code("INVALID_LOGIN_CREDENTIALS", StatusCode::BAD_REQUEST),
            AppError::Unauthorized
        ));
        assert!(matches!(
            map_error_code(
                "WEAK_PASSWORD : Password should be at least 6 characters",
                StatusCode::BAD_REQUEST
            ),
            AppError::Validation { field: "password", .. }
        ));
        assert!(matches!(
            map_error_code("", StatusCode::INTERNAL_SERVER_ERROR),
            AppError::ServiceUnavailable(_)
        ));
    }
}
