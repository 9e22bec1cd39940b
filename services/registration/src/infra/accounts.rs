use anyhow::{Context as _, anyhow};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::repository::AccountPort;
use crate::domain::types::{AccountSummary, CreatedAccount, NewAccount, ProvisionedAccount};
use crate::error::{AccountRejectCause, RegistrationServiceError};

/// HTTP port to the account service's internal API.
#[derive(Clone)]
pub struct HttpAccountPort {
    pub base_url: String,
    pub client: reqwest::Client,
}

#[derive(Deserialize)]
struct AccountDto {
    id: Uuid,
    username: String,
    host: String,
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct CreateAccountDto {
    account: AccountDto,
    secret: String,
}

#[derive(Deserialize)]
struct ReclaimedDto {
    reclaimed: bool,
}

impl From<AccountDto> for CreatedAccount {
    fn from(dto: AccountDto) -> Self {
        CreatedAccount {
            id: dto.id,
            username: dto.username,
            host: dto.host,
            created_at: dto.created_at,
        }
    }
}

impl AccountPort for HttpAccountPort {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AccountSummary>, RegistrationServiceError> {
        let response = self
            .client
            .get(format!("{}/internal/accounts", self.base_url))
            .query(&[("username", username)])
            .send()
            .await
            .context("account lookup request")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let dto: AccountDto = response
            .error_for_status()
            .context("account lookup status")?
            .json()
            .await
            .context("account lookup body")?;
        Ok(Some(AccountSummary {
            id: dto.id,
            username: dto.username,
        }))
    }

    async fn is_username_reclaimed(
        &self,
        username: &str,
    ) -> Result<bool, RegistrationServiceError> {
        let dto: ReclaimedDto = self
            .client
            .get(format!("{}/internal/reclaimed-usernames", self.base_url))
            .query(&[("username", username)])
            .send()
            .await
            .context("reclaimed-username request")?
            .error_for_status()
            .context("reclaimed-username status")?
            .json()
            .await
            .context("reclaimed-username body")?;
        Ok(dto.reclaimed)
    }

    async fn create(
        &self,
        new: &NewAccount,
    ) -> Result<ProvisionedAccount, RegistrationServiceError> {
        let response = self
            .client
            .post(format!("{}/internal/accounts", self.base_url))
            .json(new)
            .send()
            .await
            .context("account creation request")?;

        let status = response.status();
        if status.is_success() {
            let dto: CreateAccountDto = response
                .json()
                .await
                .context("account creation body")?;
            return Ok(ProvisionedAccount {
                account: dto.account.into(),
                secret: dto.secret,
            });
        }

        // Keep the remote detail server-side; callers only see a closed
        // cause set.
        let detail = response.text().await.unwrap_or_default();
        tracing::warn!(%status, detail, username = %new.username, "account service rejected creation");
        match status {
            StatusCode::CONFLICT => Err(RegistrationServiceError::AccountRejected(
                AccountRejectCause::Duplicate,
            )),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Err(
                RegistrationServiceError::AccountRejected(AccountRejectCause::InvalidInput),
            ),
            StatusCode::FORBIDDEN => Err(RegistrationServiceError::AccountRejected(
                AccountRejectCause::Policy,
            )),
            _ => Err(RegistrationServiceError::Internal(anyhow!(
                "account service returned {status}"
            ))),
        }
    }

    async fn confirm_email(
        &self,
        account_id: Uuid,
        email: &str,
    ) -> Result<(), RegistrationServiceError> {
        self.client
            .post(format!(
                "{}/internal/accounts/{account_id}/email",
                self.base_url
            ))
            .json(&serde_json::json!({ "email": email, "verified": true }))
            .send()
            .await
            .context("confirm email request")?
            .error_for_status()
            .context("confirm email status")?;
        Ok(())
    }
}
