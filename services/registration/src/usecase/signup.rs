use anyhow::anyhow;
use argon2::Argon2;
use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};
use chrono::{Duration, Utc};
use rand::RngExt;

use crate::domain::repository::{
    AccountPort, ChallengeVerifier, Mailer, PendingRegistrationRepository, ReachabilityChecker,
    TicketRepository,
};
use crate::domain::types::{
    CONFIRMATION_CODE_CHARSET, CONFIRMATION_CODE_LEN, CreatedAccount, InstancePolicy, NewAccount,
    PENDING_REGISTRATION_TTL_MINS, PendingRegistration,
};
use crate::error::RegistrationServiceError;
use crate::usecase::gate::{Admission, SignupGate, SignupRequest};

pub fn generate_confirmation_code() -> String {
    let mut rng = rand::rng();
    (0..CONFIRMATION_CODE_LEN)
        .map(|_| {
            CONFIRMATION_CODE_CHARSET[rng.random_range(0..CONFIRMATION_CODE_CHARSET.len())] as char
        })
        .collect()
}

/// Hash the submitted password at the edge; everything downstream (pending
/// store, account service) only ever sees the PHC string.
pub fn hash_password(password: &str) -> Result<String, RegistrationServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| RegistrationServiceError::Internal(anyhow!("password hashing: {e}")))?;
    Ok(hash.to_string())
}

fn confirmation_email(link: &str, host: &str) -> (String, String, String) {
    let subject = format!("Confirm your {host} account");
    let html = format!(
        "<p>Almost there. Open the link below within 30 minutes to activate \
         your account on {host}.</p><p><a href=\"{link}\">{link}</a></p>"
    );
    let text = format!(
        "Almost there. Open the link below within 30 minutes to activate \
         your account on {host}.\n\n{link}\n"
    );
    (subject, html, text)
}

fn welcome_email(username: &str, host: &str) -> (String, String, String) {
    let subject = format!("Welcome to {host}");
    let html = format!("<p>Your account <b>@{username}</b> on {host} is ready.</p>");
    let text = format!("Your account @{username} on {host} is ready.\n");
    (subject, html, text)
}

#[derive(Debug)]
pub enum SignupOutcome {
    /// Direct creation: the account and its freshly issued credential
    /// secret, returned exactly once.
    Created {
        account: CreatedAccount,
        secret: String,
    },
    /// A pending registration was created and the confirmation email sent;
    /// no account exists yet and no secret is returned.
    Pending,
}

pub struct SignupUseCase<T, P, A, R, C, M> {
    pub tickets: T,
    pub pendings: P,
    pub accounts: A,
    pub reachability: R,
    pub challenge: C,
    pub mailer: M,
    pub policy: InstancePolicy,
    /// Public base URL confirmation links are built against.
    pub instance_url: String,
}

impl<T, P, A, R, C, M> SignupUseCase<T, P, A, R, C, M>
where
    T: TicketRepository,
    P: PendingRegistrationRepository,
    A: AccountPort,
    R: ReachabilityChecker,
    C: ChallengeVerifier,
    M: Mailer,
{
    pub async fn execute(
        &self,
        request: SignupRequest,
    ) -> Result<SignupOutcome, RegistrationServiceError> {
        let gate = SignupGate {
            tickets: &self.tickets,
            accounts: &self.accounts,
            reachability: &self.reachability,
            challenge: &self.challenge,
            policy: &self.policy,
        };
        let admission = gate.admit(&request).await?;
        let password_hash = hash_password(&request.password)?;

        if self.policy.email_required {
            self.create_pending(&request, admission, password_hash)
                .await
        } else {
            self.create_direct(&request, admission, password_hash).await
        }
    }

    async fn create_direct(
        &self,
        request: &SignupRequest,
        admission: Admission,
        password_hash: String,
    ) -> Result<SignupOutcome, RegistrationServiceError> {
        // Claim the ticket first: the conditional update, not the gate's
        // read, is the single-use arbiter under concurrency.
        if let Some(ticket) = &admission.ticket {
            if !self.tickets.claim(ticket.id).await? {
                return Err(RegistrationServiceError::InvalidTicket);
            }
        }

        let new = NewAccount {
            username: request.username.clone(),
            password_hash,
            host: self.policy.host.clone(),
        };
        let provisioned = match self.accounts.create(&new).await {
            Ok(provisioned) => provisioned,
            Err(e) => {
                // Don't burn the invitation on a collaborator failure.
                if let Some(ticket) = &admission.ticket {
                    if let Err(release_err) = self.tickets.release(ticket.id).await {
                        tracing::warn!(error = %release_err, ticket_id = %ticket.id,
                            "failed to release ticket after account creation failure");
                    }
                }
                return Err(e);
            }
        };
        if let Some(ticket) = &admission.ticket {
            self.tickets
                .assign_used_by(ticket.id, provisioned.account.id)
                .await?;
        }

        // Notice mail is fire-and-forget here: the account and ticket writes
        // already succeeded and must not be undone by a mail hiccup.
        if let Some(email) = &admission.email {
            let (subject, html, text) = welcome_email(&request.username, &self.policy.host);
            if let Err(e) = self.mailer.send(email, &subject, &html, &text).await {
                tracing::warn!(error = %e, "welcome mail failed");
            }
        }

        Ok(SignupOutcome::Created {
            account: provisioned.account,
            secret: provisioned.secret,
        })
    }

    async fn create_pending(
        &self,
        request: &SignupRequest,
        admission: Admission,
        password_hash: String,
    ) -> Result<SignupOutcome, RegistrationServiceError> {
        let email = admission
            .email
            .clone()
            .ok_or_else(|| RegistrationServiceError::Internal(anyhow!("email missing after gate")))?;

        let pending = PendingRegistration::new(
            request.username.clone(),
            password_hash,
            email.clone(),
            generate_confirmation_code(),
        );
        self.pendings.create(&pending).await?;

        if let Some(ticket) = &admission.ticket {
            let stale_before = Utc::now() - Duration::minutes(PENDING_REGISTRATION_TTL_MINS);
            if !self
                .tickets
                .claim_for_pending(ticket.id, pending.id, stale_before)
                .await?
            {
                // Lost the claim race; drop the orphaned pending record.
                if let Err(cleanup_err) = self.pendings.delete(pending.id).await {
                    tracing::warn!(error = %cleanup_err, pending_id = %pending.id,
                        "failed to delete pending registration after lost ticket claim");
                }
                return Err(RegistrationServiceError::InvalidTicket);
            }
        }

        let link = format!(
            "{}/signup-complete/{}",
            self.instance_url.trim_end_matches('/'),
            pending.code
        );
        let (subject, html, text) = confirmation_email(&link, &self.policy.host);
        self.mailer.send(&email, &subject, &html, &text).await?;

        Ok(SignupOutcome::Pending)
    }
}
