use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{EmailProvider, TemplateParams};

const BREVO_SEND_URL: &str = "https://api.brevo.com/v3/smtp/email";

pub struct BrevoEmail {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl BrevoEmail {
    pub fn new(api_key: String, client: reqwest::Client) -> Self {
        Self {
            api_key,
            endpoint: BREVO_SEND_URL.to_string(),
            client,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl EmailProvider for BrevoEmail {
    fn name(&self) -> &'static str {
        "brevo"
    }

    async fn send(
        &self,
        template_id: &str,
        to: &str,
        params: &TemplateParams,
    ) -> anyhow::Result<String> {
        let template_id: i64 = template_id
            .parse()
            .with_context(|| format!("Brevo template ids are numeric, got {template_id:?}"))?;

        let body = json!({
            "templateId": template_id,
            "to": [{ "email": to }],
            "params": params,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to call Brevo API")?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse Brevo response")?;

        if !status.is_success() {
            anyhow::bail!("Brevo API error ({}): {}", status, data);
        }

        data["messageId"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing messageId in Brevo response"))
    }
}
