#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{
    AccountSummary, CaptchaProvider, NewAccount, PendingRegistration, ProvisionedAccount,
    RegistrationTicket, ValidationOutcome,
};
use crate::error::RegistrationServiceError;

/// Repository for invitation tickets. Conditional updates are the single-use
/// arbiter: a claim that affects zero rows means another request won.
pub trait TicketRepository: Send + Sync {
    async fn find_by_code(
        &self,
        code: &str,
    ) -> Result<Option<RegistrationTicket>, RegistrationServiceError>;

    /// Direct-signup claim: stamp `used_at` where the ticket is untouched.
    /// Returns `false` when the ticket was claimed concurrently.
    async fn claim(&self, id: Uuid) -> Result<bool, RegistrationServiceError>;

    /// Provisional claim for a pending registration: stamp `used_at` and
    /// `pending_registration_id` together, in one update. Succeeds only if
    /// the ticket is unconsumed and either unclaimed or claimed before
    /// `stale_before` (a lapsed provisional hold may be re-claimed).
    async fn claim_for_pending(
        &self,
        id: Uuid,
        pending_id: Uuid,
        stale_before: DateTime<Utc>,
    ) -> Result<bool, RegistrationServiceError>;

    /// Record the finalized account on a directly claimed ticket.
    async fn assign_used_by(
        &self,
        id: Uuid,
        account_id: Uuid,
    ) -> Result<(), RegistrationServiceError>;

    /// Undo a direct claim after account creation failed, so the ticket is
    /// not burned by a collaborator error. No-op on consumed tickets.
    async fn release(&self, id: Uuid) -> Result<(), RegistrationServiceError>;

    /// Consume the ticket referencing `pending_id`: set `used_by`, clear
    /// `pending_registration_id`. No-op when no ticket references it.
    async fn finalize_for_pending(
        &self,
        pending_id: Uuid,
        account_id: Uuid,
    ) -> Result<(), RegistrationServiceError>;
}

/// Store for not-yet-confirmed signups.
pub trait PendingRegistrationRepository: Send + Sync {
    /// Insert a pending registration. The unique constraint on `code` is
    /// the collision arbiter for generated confirmation codes.
    async fn create(&self, pending: &PendingRegistration)
    -> Result<(), RegistrationServiceError>;

    async fn find_by_code(
        &self,
        code: &str,
    ) -> Result<Option<PendingRegistration>, RegistrationServiceError>;

    /// Delete by id. Returns `false` if the row was already gone — callers
    /// treat that as a lost redemption race.
    async fn delete(&self, id: Uuid) -> Result<bool, RegistrationServiceError>;
}

/// Port to the account service. Username lookups are case-insensitive on
/// the account side.
pub trait AccountPort: Send + Sync {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AccountSummary>, RegistrationServiceError>;

    /// Whether the username belonged to a deleted account and was reclaimed.
    async fn is_username_reclaimed(
        &self,
        username: &str,
    ) -> Result<bool, RegistrationServiceError>;

    /// Create an account. Remote rejections surface as
    /// [`RegistrationServiceError::AccountRejected`] with a closed cause
    /// set; the raw provider detail is logged, never forwarded.
    async fn create(
        &self,
        new: &NewAccount,
    ) -> Result<ProvisionedAccount, RegistrationServiceError>;

    /// Set the profile email, mark it verified and clear any leftover
    /// verification code on the account.
    async fn confirm_email(
        &self,
        account_id: Uuid,
        email: &str,
    ) -> Result<(), RegistrationServiceError>;
}

/// One bot-challenge verification call per configured provider.
pub trait ChallengeVerifier: Send + Sync {
    async fn verify(
        &self,
        provider: CaptchaProvider,
        secret: &str,
        token: &str,
    ) -> Result<(), RegistrationServiceError>;
}

/// Email reachability check; exactly one strategy runs per call.
pub trait ReachabilityChecker: Send + Sync {
    async fn check(&self, address: &str) -> Result<ValidationOutcome, RegistrationServiceError>;
}

/// Transactional mail transport.
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        text: &str,
    ) -> Result<(), RegistrationServiceError>;
}

/// MX record lookup for the local email validator.
pub trait MxResolver: Send + Sync {
    /// `Ok(false)` means the domain resolves but has no MX records; a
    /// transport-level failure is an `Err`.
    async fn has_mx(&self, domain: &str) -> Result<bool, anyhow::Error>;
}
