use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{EmailProvider, TemplateParams};

/// Posts the message to a self-hosted HTTP endpoint that does the delivery.
pub struct WebhookEmail {
    url: String,
    client: reqwest::Client,
}

impl WebhookEmail {
    pub fn new(url: String, client: reqwest::Client) -> Self {
        Self { url, client }
    }
}

#[async_trait]
impl EmailProvider for WebhookEmail {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(
        &self,
        template_id: &str,
        to: &str,
        params: &TemplateParams,
    ) -> anyhow::Result<String> {
        let body = json!({
            "template_id": template_id,
            "to": to,
            "params": params,
        });

        let data: serde_json::Value = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .context("failed to call email webhook")?
            .error_for_status()
            .context("email webhook returned error")?
            .json()
            .await
            .context("failed to parse email webhook response")?;

        data.get("messageId")
            .or_else(|| data.get("id"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing message id in email webhook response"))
    }
}
