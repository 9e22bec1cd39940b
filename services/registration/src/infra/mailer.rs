use anyhow::anyhow;

use crate::domain::repository::Mailer;
use crate::error::RegistrationServiceError;

/// Transactional mail over the configured HTTP mail API.
#[derive(Clone)]
pub struct HttpMailer {
    pub client: reqwest::Client,
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

impl Mailer for HttpMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        text: &str,
    ) -> Result<(), RegistrationServiceError> {
        let result = self
            .client
            .post(format!("{}/messages", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "html": html,
                "text": text,
            }))
            .send()
            .await;
        let response = result.map_err(|e| {
            RegistrationServiceError::MailTransport(anyhow!(e).context("mail request"))
        })?;
        response.error_for_status().map_err(|e| {
            RegistrationServiceError::MailTransport(anyhow!(e).context("mail API status"))
        })?;
        Ok(())
    }
}
