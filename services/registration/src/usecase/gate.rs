use chrono::Utc;

use crate::domain::repository::{
    AccountPort, ChallengeVerifier, ReachabilityChecker, TicketRepository,
};
use crate::domain::types::{CaptchaProvider, InstancePolicy, RegistrationTicket, UnavailableReason};
use crate::error::RegistrationServiceError;

/// Inbound signup request, as submitted by the client.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub invitation_code: Option<String>,
    pub hcaptcha_response: Option<String>,
    pub recaptcha_response: Option<String>,
    pub turnstile_response: Option<String>,
}

/// What an admitted request carries into the orchestrator.
#[derive(Debug, Clone)]
pub struct Admission {
    /// The matched ticket, when registration is closed. Not yet claimed —
    /// claiming is the orchestrator's conditional write.
    pub ticket: Option<RegistrationTicket>,
    pub email: Option<String>,
}

/// Instance-wide precondition gate. Short-circuits on the first violation;
/// pure decision logic over the policy snapshot plus ticket/account lookups.
pub struct SignupGate<'a, T, A, R, C> {
    pub tickets: &'a T,
    pub accounts: &'a A,
    pub reachability: &'a R,
    pub challenge: &'a C,
    pub policy: &'a InstancePolicy,
}

impl<'a, T, A, R, C> SignupGate<'a, T, A, R, C>
where
    T: TicketRepository,
    A: AccountPort,
    R: ReachabilityChecker,
    C: ChallengeVerifier,
{
    pub async fn admit(
        &self,
        request: &SignupRequest,
    ) -> Result<Admission, RegistrationServiceError> {
        self.verify_challenges(request).await?;
        let email = self.check_email(request).await?;
        let ticket = self.check_ticket(request).await?;
        if self.policy.email_required {
            self.check_username(&request.username).await?;
        }
        Ok(Admission { ticket, email })
    }

    async fn verify_challenges(
        &self,
        request: &SignupRequest,
    ) -> Result<(), RegistrationServiceError> {
        if self.policy.captcha_test_mode {
            return Ok(());
        }
        for cfg in &self.policy.captcha {
            let token = match cfg.provider {
                CaptchaProvider::Hcaptcha => request.hcaptcha_response.as_deref(),
                CaptchaProvider::Recaptcha => request.recaptcha_response.as_deref(),
                CaptchaProvider::Turnstile => request.turnstile_response.as_deref(),
            }
            .ok_or(RegistrationServiceError::InvalidChallenge)?;
            self.challenge
                .verify(cfg.provider, &cfg.secret, token)
                .await?;
        }
        Ok(())
    }

    async fn check_email(
        &self,
        request: &SignupRequest,
    ) -> Result<Option<String>, RegistrationServiceError> {
        if !self.policy.email_required {
            return Ok(request.email.clone());
        }
        let address = request
            .email
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or(RegistrationServiceError::EmailUnavailable(Some(
                UnavailableReason::Format,
            )))?;
        // Split on the last '@': a quoted local part may itself contain one.
        if let Some((_, domain)) = address.rsplit_once('@') {
            if self
                .policy
                .banned_email_domains
                .iter()
                .any(|banned| banned.eq_ignore_ascii_case(domain))
            {
                return Err(RegistrationServiceError::EmailUnavailable(Some(
                    UnavailableReason::Blacklist,
                )));
            }
        }
        let outcome = self.reachability.check(address).await?;
        if !outcome.valid {
            return Err(RegistrationServiceError::EmailUnavailable(outcome.reason));
        }
        Ok(Some(address.to_owned()))
    }

    async fn check_ticket(
        &self,
        request: &SignupRequest,
    ) -> Result<Option<RegistrationTicket>, RegistrationServiceError> {
        if self.policy.registration_open {
            return Ok(None);
        }
        let code = request
            .invitation_code
            .as_deref()
            .ok_or(RegistrationServiceError::InvalidTicket)?;
        let ticket = self
            .tickets
            .find_by_code(code)
            .await?
            .ok_or(RegistrationServiceError::InvalidTicket)?;
        let now = Utc::now();
        if ticket.is_consumed() || ticket.is_expired(now) {
            return Err(RegistrationServiceError::InvalidTicket);
        }
        if self.policy.email_required {
            // A confirmation may still be outstanding for this ticket;
            // reject re-claims until the pending window lapses.
            if ticket.provisional_hold_active(now) {
                return Err(RegistrationServiceError::InvalidTicket);
            }
        } else if ticket.used_at.is_some() {
            // Single redemption only on the direct path.
            return Err(RegistrationServiceError::InvalidTicket);
        }
        Ok(Some(ticket))
    }

    async fn check_username(&self, username: &str) -> Result<(), RegistrationServiceError> {
        if self.accounts.find_by_username(username).await?.is_some() {
            return Err(RegistrationServiceError::DuplicatedUsername);
        }
        if self.accounts.is_username_reclaimed(username).await? {
            return Err(RegistrationServiceError::UsedUsername);
        }
        if self
            .policy
            .reserved_usernames
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(username))
        {
            return Err(RegistrationServiceError::DeniedUsername);
        }
        Ok(())
    }
}
