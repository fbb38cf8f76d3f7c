use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{EmailProvider, TemplateParams};

const EMAILJS_SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

pub struct EmailJs {
    service_id: String,
    user_id: String,
    client: reqwest::Client,
}

impl EmailJs {
    pub fn new(service_id: String, user_id: String, client: reqwest::Client) -> Self {
        Self {
            service_id,
            user_id,
            client,
        }
    }
}

#[async_trait]
impl EmailProvider for EmailJs {
    fn name(&self) -> &'static str {
        "emailjs"
    }

    async fn send(
        &self,
        template_id: &str,
        to: &str,
        params: &TemplateParams,
    ) -> anyhow::Result<String> {
        let mut template_params = params.clone();
        template_params.insert("to_email".to_string(), json!(to));

        let body = json!({
            "service_id": self.service_id,
            "template_id": template_id,
            "user_id": self.user_id,
            "template_params": template_params,
        });

        self.client
            .post(EMAILJS_SEND_URL)
            .json(&body)
            .send()
            .await
            .context("failed to call EmailJS API")?
            .error_for_status()
            .context("EmailJS API returned error")?;

        // EmailJS answers with a bare "OK"; mint a local id for log correlation.
        Ok(format!("emailjs-{}", uuid::Uuid::new_v4()))
    }
}
