use anyhow::Context;
use async_trait::async_trait;

#[async_trait]
pub trait NewsletterProvider: Send + Sync {
    async fn subscribe(&self, email: &str, locale: &str) -> anyhow::Result<()>;
}

/// Hosted signup form (Brevo/Sendinblue style). The endpoint answers with
/// HTML, so success is judged from the status code alone.
pub struct HostedFormNewsletter {
    form_url: String,
    client: reqwest::Client,
}

impl HostedFormNewsletter {
    pub fn new(form_url: String, client: reqwest::Client) -> Self {
        Self { form_url, client }
    }
}

#[async_trait]
impl NewsletterProvider for HostedFormNewsletter {
    async fn subscribe(&self, email: &str, locale: &str) -> anyhow::Result<()> {
        if self.form_url.is_empty() {
            anyhow::bail!("newsletter form URL is not configured");
        }

        self.client
            .post(&self.form_url)
            // `email_address_check` is the honeypot field and must stay empty.
            .form(&[
                ("EMAIL", email),
                ("email_address_check", ""),
                ("locale", locale),
            ])
            .send()
            .await
            .context("failed to post newsletter form")?
            .error_for_status()
            .context("newsletter form rejected the signup")?;

        Ok(())
    }
}
