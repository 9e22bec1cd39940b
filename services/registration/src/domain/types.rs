use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

/// How long a pending registration (and a provisional ticket claim backing
/// it) stays redeemable, in minutes.
pub const PENDING_REGISTRATION_TTL_MINS: i64 = 30;

/// Confirmation code length in characters.
pub const CONFIRMATION_CODE_LEN: usize = 16;

/// Charset for confirmation codes: lowercase alphanumerics with the
/// ambiguous glyphs (0/o, 1/l/i) removed, since the code also appears in a
/// link users may retype.
pub const CONFIRMATION_CODE_CHARSET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";

/// Pre-issued invitation ticket.
#[derive(Debug, Clone)]
pub struct RegistrationTicket {
    pub id: Uuid,
    pub code: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<Uuid>,
    pub pending_registration_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl RegistrationTicket {
    /// Permanently consumed: an account was finalized against this ticket.
    pub fn is_consumed(&self) -> bool {
        self.used_by.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Provisionally claimed by a pending registration whose confirmation
    /// window is still open. Such tickets must not be claimed again until
    /// the window lapses.
    pub fn provisional_hold_active(&self, now: DateTime<Utc>) -> bool {
        self.used_by.is_none()
            && self
                .used_at
                .is_some_and(|at| now - at < Duration::minutes(PENDING_REGISTRATION_TTL_MINS))
    }
}

/// Unconfirmed signup awaiting email confirmation, keyed by a one-time code.
#[derive(Debug, Clone)]
pub struct PendingRegistration {
    pub id: Uuid,
    pub code: String,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl PendingRegistration {
    pub fn new(username: String, password_hash: String, email: String, code: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            code,
            username,
            password_hash,
            email,
            created_at: Utc::now(),
        }
    }

    /// Expiry is derived from `created_at`, never stored separately, and is
    /// re-checked at redemption time even when the row still exists.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= Duration::minutes(PENDING_REGISTRATION_TTL_MINS)
    }
}

/// Canonical reason taxonomy every reachability strategy translates its
/// provider-specific response into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnavailableReason {
    Format,
    Disposable,
    Mx,
    Smtp,
    Network,
    Blacklist,
}

impl UnavailableReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::Disposable => "disposable",
            Self::Mx => "mx",
            Self::Smtp => "smtp",
            Self::Network => "network",
            Self::Blacklist => "blacklist",
        }
    }

    /// Map a native validator/provider code into the canonical taxonomy.
    /// `regex` is the local validator's name for a syntax failure;
    /// unrecognized codes map to `None` (indeterminate).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "regex" | "format" => Some(Self::Format),
            "disposable" => Some(Self::Disposable),
            "mx" => Some(Self::Mx),
            "smtp" => Some(Self::Smtp),
            "network" => Some(Self::Network),
            "blacklist" => Some(Self::Blacklist),
            _ => None,
        }
    }
}

/// Uniform result of an email-reachability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub reason: Option<UnavailableReason>,
}

impl ValidationOutcome {
    pub fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn unavailable(reason: Option<UnavailableReason>) -> Self {
        Self {
            valid: false,
            reason,
        }
    }
}

/// Supported bot-challenge providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptchaProvider {
    Hcaptcha,
    Recaptcha,
    Turnstile,
}

impl CaptchaProvider {
    pub fn verify_url(&self) -> &'static str {
        match self {
            Self::Hcaptcha => "https://hcaptcha.com/siteverify",
            Self::Recaptcha => "https://www.google.com/recaptcha/api/siteverify",
            Self::Turnstile => "https://challenges.cloudflare.com/turnstile/v0/siteverify",
        }
    }
}

/// One configured bot-challenge provider with its verification secret.
#[derive(Debug, Clone)]
pub struct CaptchaConfig {
    pub provider: CaptchaProvider,
    pub secret: String,
}

/// Read-only snapshot of instance-wide registration policy, taken from
/// configuration at startup.
#[derive(Debug, Clone)]
pub struct InstancePolicy {
    /// Hostname local accounts are created under.
    pub host: String,
    /// When false, signup requires a valid invitation code.
    pub registration_open: bool,
    /// When true, signups go through the pending-registration email flow.
    pub email_required: bool,
    pub reserved_usernames: Vec<String>,
    pub banned_email_domains: Vec<String>,
    pub captcha: Vec<CaptchaConfig>,
    /// Skips bot-challenge verification entirely (test deployments only).
    pub captcha_test_mode: bool,
}

/// Account-creation request handed to the account service.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub username: String,
    /// argon2 PHC string; the account service stores it as-is.
    pub password_hash: String,
    pub host: String,
}

/// Minimal account data returned by username lookups.
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub id: Uuid,
    pub username: String,
}

/// A freshly created account.
#[derive(Debug, Clone)]
pub struct CreatedAccount {
    pub id: Uuid,
    pub username: String,
    pub host: String,
    pub created_at: DateTime<Utc>,
}

/// Account plus the credential secret issued exactly once, at creation.
#[derive(Debug, Clone)]
pub struct ProvisionedAccount {
    pub account: CreatedAccount,
    pub secret: String,
}
