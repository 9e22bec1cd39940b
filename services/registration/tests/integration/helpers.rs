use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use corvid_registration::domain::repository::{
    AccountPort, ChallengeVerifier, Mailer, PendingRegistrationRepository, ReachabilityChecker,
    TicketRepository,
};
use corvid_registration::domain::types::{
    AccountSummary, CaptchaProvider, CreatedAccount, InstancePolicy, NewAccount,
    PendingRegistration, ProvisionedAccount, RegistrationTicket, ValidationOutcome,
};
use corvid_registration::error::{AccountRejectCause, RegistrationServiceError};

// ── Policy fixtures ──────────────────────────────────────────────────────────

pub fn open_policy() -> InstancePolicy {
    InstancePolicy {
        host: "corvid.example".to_owned(),
        registration_open: true,
        email_required: false,
        reserved_usernames: vec![],
        banned_email_domains: vec![],
        captcha: vec![],
        captcha_test_mode: false,
    }
}

pub fn email_required_policy() -> InstancePolicy {
    InstancePolicy {
        email_required: true,
        ..open_policy()
    }
}

pub fn closed_policy() -> InstancePolicy {
    InstancePolicy {
        registration_open: false,
        ..open_policy()
    }
}

pub fn fresh_ticket(code: &str) -> RegistrationTicket {
    RegistrationTicket {
        id: Uuid::new_v4(),
        code: code.to_owned(),
        expires_at: None,
        used_at: None,
        used_by: None,
        pending_registration_id: None,
        created_at: Utc::now(),
    }
}

// ── MockTicketRepo ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockTicketRepo {
    pub tickets: Arc<Mutex<Vec<RegistrationTicket>>>,
}

impl MockTicketRepo {
    pub fn new(tickets: Vec<RegistrationTicket>) -> Self {
        Self {
            tickets: Arc::new(Mutex::new(tickets)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn get(&self, id: Uuid) -> RegistrationTicket {
        self.tickets
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .expect("ticket in mock")
    }
}

impl TicketRepository for MockTicketRepo {
    async fn find_by_code(
        &self,
        code: &str,
    ) -> Result<Option<RegistrationTicket>, RegistrationServiceError> {
        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.code == code)
            .cloned())
    }

    async fn claim(&self, id: Uuid) -> Result<bool, RegistrationServiceError> {
        let mut tickets = self.tickets.lock().unwrap();
        let Some(ticket) = tickets.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        if ticket.used_at.is_some() || ticket.used_by.is_some() {
            return Ok(false);
        }
        ticket.used_at = Some(Utc::now());
        Ok(true)
    }

    async fn claim_for_pending(
        &self,
        id: Uuid,
        pending_id: Uuid,
        stale_before: DateTime<Utc>,
    ) -> Result<bool, RegistrationServiceError> {
        let mut tickets = self.tickets.lock().unwrap();
        let Some(ticket) = tickets.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        let claimable = ticket.used_by.is_none()
            && ticket.used_at.is_none_or(|at| at <= stale_before);
        if !claimable {
            return Ok(false);
        }
        ticket.used_at = Some(Utc::now());
        ticket.pending_registration_id = Some(pending_id);
        Ok(true)
    }

    async fn assign_used_by(
        &self,
        id: Uuid,
        account_id: Uuid,
    ) -> Result<(), RegistrationServiceError> {
        let mut tickets = self.tickets.lock().unwrap();
        if let Some(ticket) = tickets.iter_mut().find(|t| t.id == id) {
            ticket.used_by = Some(account_id);
        }
        Ok(())
    }

    async fn release(&self, id: Uuid) -> Result<(), RegistrationServiceError> {
        let mut tickets = self.tickets.lock().unwrap();
        if let Some(ticket) = tickets.iter_mut().find(|t| t.id == id && t.used_by.is_none()) {
            ticket.used_at = None;
            ticket.pending_registration_id = None;
        }
        Ok(())
    }

    async fn finalize_for_pending(
        &self,
        pending_id: Uuid,
        account_id: Uuid,
    ) -> Result<(), RegistrationServiceError> {
        let mut tickets = self.tickets.lock().unwrap();
        if let Some(ticket) = tickets
            .iter_mut()
            .find(|t| t.pending_registration_id == Some(pending_id))
        {
            ticket.used_by = Some(account_id);
            ticket.pending_registration_id = None;
        }
        Ok(())
    }
}

// ── MockPendingRepo ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockPendingRepo {
    pub rows: Arc<Mutex<Vec<PendingRegistration>>>,
}

impl MockPendingRepo {
    pub fn new(rows: Vec<PendingRegistration>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn first(&self) -> PendingRegistration {
        self.rows
            .lock()
            .unwrap()
            .first()
            .cloned()
            .expect("pending registration in mock")
    }
}

impl PendingRegistrationRepository for MockPendingRepo {
    async fn create(
        &self,
        pending: &PendingRegistration,
    ) -> Result<(), RegistrationServiceError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| r.code == pending.code) {
            return Err(RegistrationServiceError::Internal(anyhow::anyhow!(
                "confirmation code collision"
            )));
        }
        rows.push(pending.clone());
        Ok(())
    }

    async fn find_by_code(
        &self,
        code: &str,
    ) -> Result<Option<PendingRegistration>, RegistrationServiceError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.code == code)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RegistrationServiceError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() < before)
    }
}

// ── MockAccountPort ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockAccountPort {
    pub existing: Vec<AccountSummary>,
    pub reclaimed: Vec<String>,
    pub created: Arc<Mutex<Vec<NewAccount>>>,
    pub confirmed: Arc<Mutex<Vec<(Uuid, String)>>>,
    pub fail_create: Option<AccountRejectCause>,
}

impl MockAccountPort {
    pub fn new() -> Self {
        Self {
            existing: vec![],
            reclaimed: vec![],
            created: Arc::new(Mutex::new(vec![])),
            confirmed: Arc::new(Mutex::new(vec![])),
            fail_create: None,
        }
    }

    pub fn with_existing(mut self, username: &str) -> Self {
        self.existing.push(AccountSummary {
            id: Uuid::new_v4(),
            username: username.to_owned(),
        });
        self
    }

    pub fn with_reclaimed(mut self, username: &str) -> Self {
        self.reclaimed.push(username.to_owned());
        self
    }

    pub fn failing_with(mut self, cause: AccountRejectCause) -> Self {
        self.fail_create = Some(cause);
        self
    }
}

impl AccountPort for MockAccountPort {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AccountSummary>, RegistrationServiceError> {
        // Case-insensitive, matching the account service's contract.
        Ok(self
            .existing
            .iter()
            .find(|a| a.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn is_username_reclaimed(
        &self,
        username: &str,
    ) -> Result<bool, RegistrationServiceError> {
        Ok(self
            .reclaimed
            .iter()
            .any(|u| u.eq_ignore_ascii_case(username)))
    }

    async fn create(
        &self,
        new: &NewAccount,
    ) -> Result<ProvisionedAccount, RegistrationServiceError> {
        if let Some(cause) = self.fail_create {
            return Err(RegistrationServiceError::AccountRejected(cause));
        }
        self.created.lock().unwrap().push(new.clone());
        Ok(ProvisionedAccount {
            account: CreatedAccount {
                id: Uuid::new_v4(),
                username: new.username.clone(),
                host: new.host.clone(),
                created_at: Utc::now(),
            },
            secret: "secret-token".to_owned(),
        })
    }

    async fn confirm_email(
        &self,
        account_id: Uuid,
        email: &str,
    ) -> Result<(), RegistrationServiceError> {
        self.confirmed
            .lock()
            .unwrap()
            .push((account_id, email.to_owned()));
        Ok(())
    }
}

// ── FakeReachability / FakeChallenge / MockMailer ────────────────────────────

pub struct FakeReachability {
    pub outcome: ValidationOutcome,
}

impl ReachabilityChecker for FakeReachability {
    async fn check(&self, _address: &str) -> Result<ValidationOutcome, RegistrationServiceError> {
        Ok(self.outcome)
    }
}

pub struct FakeChallenge {
    pub ok: bool,
    pub calls: Arc<Mutex<Vec<CaptchaProvider>>>,
}

impl FakeChallenge {
    pub fn accepting() -> Self {
        Self {
            ok: true,
            calls: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            ok: false,
            ..Self::accepting()
        }
    }
}

impl ChallengeVerifier for FakeChallenge {
    async fn verify(
        &self,
        provider: CaptchaProvider,
        _secret: &str,
        _token: &str,
    ) -> Result<(), RegistrationServiceError> {
        self.calls.lock().unwrap().push(provider);
        if self.ok {
            Ok(())
        } else {
            Err(RegistrationServiceError::InvalidChallenge)
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Clone)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<SentMail>>>,
    pub fail: bool,
}

impl MockMailer {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(vec![])),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }
}

impl Mailer for MockMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        text: &str,
    ) -> Result<(), RegistrationServiceError> {
        if self.fail {
            return Err(RegistrationServiceError::MailTransport(anyhow::anyhow!(
                "mail API unreachable"
            )));
        }
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_owned(),
            subject: subject.to_owned(),
            html: html.to_owned(),
            text: text.to_owned(),
        });
        Ok(())
    }
}

// ── Request fixture ──────────────────────────────────────────────────────────

pub fn signup_request(username: &str) -> corvid_registration::usecase::gate::SignupRequest {
    corvid_registration::usecase::gate::SignupRequest {
        username: username.to_owned(),
        password: "correct horse battery staple".to_owned(),
        email: Some(format!("{username}@example.com")),
        invitation_code: None,
        hcaptcha_response: None,
        recaptcha_response: None,
        turnstile_response: None,
    }
}
