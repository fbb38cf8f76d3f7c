pub mod brevo;
pub mod emailjs;
pub mod webhook;

use async_trait::async_trait;

pub type TemplateParams = serde_json::Map<String, serde_json::Value>;

/// A transactional email backend. Returns the provider's message id.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(
        &self,
        template_id: &str,
        to: &str,
        params: &TemplateParams,
    ) -> anyhow::Result<String>;
}
