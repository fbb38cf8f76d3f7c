use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::errors::AppError;
use crate::models::{ContactForm, FormFields};
use crate::services::email::{EmailProvider, TemplateParams};
use crate::services::form::{FormState, SubmitRejected};

#[derive(Debug, Clone, Serialize)]
pub struct ContactReceipt {
    pub message_id: String,
}

/// Validates a contact submission and hands it to the email provider.
#[derive(Clone)]
pub struct ContactService {
    email: Arc<dyn EmailProvider>,
    inbox: String,
    template_id: String,
    timeout: Duration,
}

impl ContactService {
    pub fn new(
        email: Arc<dyn EmailProvider>,
        inbox: String,
        template_id: String,
        timeout: Duration,
    ) -> Self {
        Self {
            email,
            inbox,
            template_id,
            timeout,
        }
    }

    pub async fn submit(&self, form: ContactForm) -> Result<ContactReceipt, AppError> {
        let mut state = FormState::<ContactForm>::new();
        for &field in ContactForm::FIELDS {
            state.set_field(field, form.get(field));
        }

        let payload = match state.begin_submit() {
            Ok(payload) => payload,
            Err(SubmitRejected::Invalid(errors)) => return Err(AppError::InvalidForm(errors)),
            Err(SubmitRejected::InFlight) => {
                return Err(AppError::Conflict("submission already in progress".to_string()))
            }
        };

        let params = template_params(&payload);
        let sent = tokio::time::timeout(
            self.timeout,
            self.email.send(&self.template_id, &self.inbox, &params),
        )
        .await;

        match sent {
            Ok(Ok(message_id)) => {
                state.finish(Ok(()));
                tracing::info!(
                    provider = self.email.name(),
                    message_id = %message_id,
                    "contact message sent"
                );
                Ok(ContactReceipt { message_id })
            }
            Ok(Err(e)) => {
                state.finish(Err(e.to_string()));
                Err(AppError::ServiceUnavailable(format!(
                    "{} send failed: {e:#}",
                    self.email.name()
                )))
            }
            Err(_) => {
                state.finish(Err("timed out".to_string()));
                Err(AppError::ServiceUnavailable(format!(
                    "{} send timed out after {:?}",
                    self.email.name(),
                    self.timeout
                )))
            }
        }
    }
}

fn template_params(form: &ContactForm) -> TemplateParams {
    let mut params = TemplateParams::new();
    params.insert("name".to_string(), json!(form.name));
    params.insert("email".to_string(), json!(form.email));
    params.insert("phone".to_string(), json!(form.phone));
    params.insert("service".to_string(), json!(form.service));
    params.insert("message".to_string(), json!(form.message));
    params.insert(
        "submitted_at".to_string(),
        json!(Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()),
    );
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Field;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingEmail {
        sent: Mutex<Vec<(String, String, TemplateParams)>>,
        fail: bool,
    }

    #[async_trait]
    impl EmailProvider for RecordingEmail {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(
            &self,
            template_id: &str,
            to: &str,
            params: &TemplateParams,
        ) -> anyhow::Result<String> {
            if self.fail {
                anyhow::bail!("provider down");
            }
            self.sent
                .lock()
                .unwrap()
                .push((template_id.to_string(), to.to_string(), params.clone()));
            Ok("msg-1".to_string())
        }
    }

    struct SlowEmail;

    #[async_trait]
    impl EmailProvider for SlowEmail {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn send(&self, _: &str, _: &str, _: &TemplateParams) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("late".to_string())
        }
    }

    fn form() -> ContactForm {
        ContactForm {
            name: " Jane ".to_string(),
            email: "jane@example.com".to_string(),
            phone: "0612345678".to_string(),
            service: "Group Training".to_string(),
            message: "Can I join <script>evil()</script>on Saturdays?".to_string(),
        }
    }

    fn service(provider: Arc<dyn EmailProvider>) -> ContactService {
        ContactService::new(
            provider,
            "coach@example.com".to_string(),
            "42".to_string(),
            Duration::from_secs(10),
        )
    }

    #[tokio::test]
    async fn test_valid_submission_is_sanitized_and_sent() {
        let provider = Arc::new(RecordingEmail {
            sent: Mutex::new(vec![]),
            fail: false,
        });
        let receipt = service(provider.clone()).submit(form()).await.unwrap();
        assert_eq!(receipt.message_id, "msg-1");

        let sent = provider.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (template, to, params) = &sent[0];
        assert_eq!(template, "42");
        assert_eq!(to, "coach@example.com");
        assert_eq!(params["name"], "Jane");
        assert_eq!(params["message"], "Can I join on Saturdays?");
    }

    #[tokio::test]
    async fn test_invalid_submission_reports_every_field() {
        let provider = Arc::new(RecordingEmail {
            sent: Mutex::new(vec![]),
            fail: false,
        });
        let mut bad = form();
        bad.email = "nope".to_string();
        bad.phone = String::new();

        let err = service(provider.clone()).submit(bad).await.unwrap_err();
        match err {
            AppError::InvalidForm(errors) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(
                    errors.get(&Field::Email).map(String::as_str),
                    Some("Please enter a valid email address")
                );
                assert_eq!(
                    errors.get(&Field::Phone).map(String::as_str),
                    Some("Phone is required")
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(provider.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_script_only_fields_are_not_sent() {
        let provider = Arc::new(RecordingEmail {
            sent: Mutex::new(vec![]),
            fail: false,
        });
        let mut bad = form();
        bad.name = "<script>x()</script>".to_string();
        bad.message = "javascript:".to_string();

        let err = service(provider.clone()).submit(bad).await.unwrap_err();
        match err {
            AppError::InvalidForm(errors) => {
                assert!(errors.contains_key(&Field::Name));
                assert!(errors.contains_key(&Field::Message));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(provider.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_service_unavailable() {
        let provider = Arc::new(RecordingEmail {
            sent: Mutex::new(vec![]),
            fail: true,
        });
        let err = service(provider).submit(form()).await.unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let err = service(Arc::new(SlowEmail)).submit(form()).await.unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(msg) if msg.contains("timed out")));
    }
}
