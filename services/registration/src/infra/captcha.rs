use anyhow::Context as _;
use serde::Deserialize;

use crate::domain::repository::ChallengeVerifier;
use crate::domain::types::CaptchaProvider;
use crate::error::RegistrationServiceError;

/// Verifies challenge tokens against the providers' `siteverify` endpoints.
/// All three supported providers speak the same form-encoded protocol.
#[derive(Clone)]
pub struct HttpChallengeVerifier {
    pub client: reqwest::Client,
}

#[derive(Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl ChallengeVerifier for HttpChallengeVerifier {
    async fn verify(
        &self,
        provider: CaptchaProvider,
        secret: &str,
        token: &str,
    ) -> Result<(), RegistrationServiceError> {
        let response: SiteverifyResponse = self
            .client
            .post(provider.verify_url())
            .form(&[("secret", secret), ("response", token)])
            .send()
            .await
            .context("challenge verification request")?
            .error_for_status()
            .context("challenge verification status")?
            .json()
            .await
            .context("challenge verification body")?;

        if !response.success {
            tracing::debug!(?provider, error_codes = ?response.error_codes,
                "challenge verification failed");
            return Err(RegistrationServiceError::InvalidChallenge);
        }
        Ok(())
    }
}
