use chrono::Utc;

use crate::domain::repository::{AccountPort, PendingRegistrationRepository, TicketRepository};
use crate::domain::types::{CreatedAccount, NewAccount};
use crate::error::RegistrationServiceError;
use crate::usecase::session::{issue_access_token, issue_refresh_token};

pub struct CompleteSignupInput {
    pub code: String,
}

#[derive(Debug)]
pub struct CompleteSignupOutput {
    pub account: CreatedAccount,
    pub access_token: String,
    pub access_token_exp: u64,
    pub refresh_token: String,
}

/// Redeems a confirmation code into a live account and a session.
pub struct CompleteSignupUseCase<P, T, A> {
    pub pendings: P,
    pub tickets: T,
    pub accounts: A,
    pub host: String,
    pub jwt_secret: String,
}

impl<P, T, A> CompleteSignupUseCase<P, T, A>
where
    P: PendingRegistrationRepository,
    T: TicketRepository,
    A: AccountPort,
{
    pub async fn execute(
        &self,
        input: CompleteSignupInput,
    ) -> Result<CompleteSignupOutput, RegistrationServiceError> {
        let pending = self
            .pendings
            .find_by_code(&input.code)
            .await?
            .ok_or(RegistrationServiceError::PendingNotFound)?;

        // Age is derived from creation time and re-checked here: an expired
        // row may still physically exist but must never become an account.
        if pending.is_expired(Utc::now()) {
            return Err(RegistrationServiceError::PendingExpired);
        }

        // The conditional delete is the single-redemption arbiter: a second
        // concurrent completion reads zero rows affected and fails here.
        if !self.pendings.delete(pending.id).await? {
            return Err(RegistrationServiceError::PendingNotFound);
        }

        // The stored hash goes through as-is; the password is never re-hashed.
        let provisioned = self
            .accounts
            .create(&NewAccount {
                username: pending.username.clone(),
                password_hash: pending.password_hash.clone(),
                host: self.host.clone(),
            })
            .await?;
        let account = provisioned.account;

        self.accounts.confirm_email(account.id, &pending.email).await?;
        self.tickets
            .finalize_for_pending(pending.id, account.id)
            .await?;

        let (access_token, access_token_exp) = issue_access_token(account.id, &self.jwt_secret)?;
        let refresh_token = issue_refresh_token(account.id, &self.jwt_secret)?;

        Ok(CompleteSignupOutput {
            account,
            access_token,
            access_token_exp,
            refresh_token,
        })
    }
}
