use anyhow::Context as _;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use regex::Regex;
use serde::Deserialize;

use crate::domain::repository::{MxResolver, ReachabilityChecker};
use crate::domain::types::{UnavailableReason, ValidationOutcome};
use crate::error::RegistrationServiceError;

const VERIFYMAIL_API_BASE: &str = "https://verifymail.io/api";

/// HTML5-style address syntax, domain required to carry a dotted label.
const EMAIL_SYNTAX: &str = r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$";

/// Domains of well-known throwaway inbox services.
const DISPOSABLE_DOMAINS: &[&str] = &[
    "10minutemail.com",
    "discard.email",
    "dispostable.com",
    "fakeinbox.com",
    "getnada.com",
    "guerrillamail.com",
    "maildrop.cc",
    "mailinator.com",
    "mintemail.com",
    "moakt.com",
    "mohmal.com",
    "sharklasers.com",
    "spambog.com",
    "temp-mail.org",
    "tempr.email",
    "throwawaymail.com",
    "trashmail.com",
    "yopmail.com",
];

// ── Strategy selection ────────────────────────────────────────────────────────

/// The one reachability strategy this instance runs, chosen by configuration
/// with fixed precedence: Verifymail key, then Truemail instance + key, then
/// the local validator.
#[derive(Clone)]
pub enum EmailReachability {
    Verifymail(VerifymailChecker),
    Truemail(TruemailChecker),
    Local(LocalChecker<HickoryMxResolver>),
}

impl EmailReachability {
    pub fn from_config(
        client: reqwest::Client,
        verifymail_api_key: Option<String>,
        truemail_instance: Option<String>,
        truemail_auth_key: Option<String>,
    ) -> Self {
        if let Some(api_key) = verifymail_api_key {
            return Self::Verifymail(VerifymailChecker { client, api_key });
        }
        if let (Some(instance_url), Some(auth_key)) = (truemail_instance, truemail_auth_key) {
            return Self::Truemail(TruemailChecker {
                client,
                instance_url,
                auth_key,
            });
        }
        Self::Local(LocalChecker::new(HickoryMxResolver::new()))
    }
}

impl ReachabilityChecker for EmailReachability {
    async fn check(&self, address: &str) -> Result<ValidationOutcome, RegistrationServiceError> {
        match self {
            Self::Verifymail(checker) => checker.check(address).await,
            Self::Truemail(checker) => checker.check(address).await,
            Self::Local(checker) => checker.check(address).await,
        }
    }
}

// ── Verifymail-style remote API ───────────────────────────────────────────────

#[derive(Clone)]
pub struct VerifymailChecker {
    pub client: reqwest::Client,
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifymailResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    deliverable_email: Option<bool>,
    #[serde(default)]
    disposable: Option<bool>,
    #[serde(default)]
    mx: Option<bool>,
}

/// Translate a Verifymail response into the canonical taxonomy. A body that
/// carries only `message` (quota/auth problems) is an indeterminate provider
/// error, not a format failure.
fn map_verifymail(response: &VerifymailResponse) -> ValidationOutcome {
    let structureless = response.deliverable_email.is_none()
        && response.disposable.is_none()
        && response.mx.is_none();
    if response.message.is_some() && structureless {
        return ValidationOutcome::unavailable(None);
    }
    match response.deliverable_email {
        None => return ValidationOutcome::unavailable(Some(UnavailableReason::Format)),
        Some(false) => return ValidationOutcome::unavailable(Some(UnavailableReason::Smtp)),
        Some(true) => {}
    }
    if response.disposable == Some(true) {
        return ValidationOutcome::unavailable(Some(UnavailableReason::Disposable));
    }
    if response.mx == Some(false) {
        return ValidationOutcome::unavailable(Some(UnavailableReason::Mx));
    }
    ValidationOutcome::ok()
}

impl ReachabilityChecker for VerifymailChecker {
    async fn check(&self, address: &str) -> Result<ValidationOutcome, RegistrationServiceError> {
        // Transport failures here are fatal by contract; callers see them as
        // internal errors rather than a reachability outcome.
        let response: VerifymailResponse = self
            .client
            .get(format!("{VERIFYMAIL_API_BASE}/{address}"))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .context("verifymail request")?
            .json()
            .await
            .context("verifymail body")?;
        Ok(map_verifymail(&response))
    }
}

// ── Truemail-style self-hosted API ────────────────────────────────────────────

#[derive(Clone)]
pub struct TruemailChecker {
    pub client: reqwest::Client,
    pub instance_url: String,
    pub auth_key: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TruemailResponse {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Option<TruemailErrors>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TruemailErrors {
    #[serde(default)]
    regex: Option<String>,
    #[serde(default)]
    smtp: Option<String>,
    #[serde(default)]
    mx: Option<String>,
    #[serde(default)]
    list_match: Option<String>,
}

fn map_truemail(response: &TruemailResponse) -> ValidationOutcome {
    let errors = response.errors.as_ref();
    if response.email.is_none() || errors.is_some_and(|e| e.regex.is_some()) {
        return ValidationOutcome::unavailable(Some(UnavailableReason::Format));
    }
    if errors.is_some_and(|e| e.smtp.is_some()) {
        return ValidationOutcome::unavailable(Some(UnavailableReason::Smtp));
    }
    if errors.is_some_and(|e| e.mx.is_some()) {
        return ValidationOutcome::unavailable(Some(UnavailableReason::Mx));
    }
    if !response.success {
        let reason = errors
            .and_then(|e| e.list_match.as_deref())
            .and_then(UnavailableReason::from_code)
            .unwrap_or(UnavailableReason::Blacklist);
        return ValidationOutcome::unavailable(Some(reason));
    }
    ValidationOutcome::ok()
}

impl ReachabilityChecker for TruemailChecker {
    async fn check(&self, address: &str) -> Result<ValidationOutcome, RegistrationServiceError> {
        // Any transport-level failure maps to `network` for this strategy.
        let result = self
            .client
            .get(&self.instance_url)
            .query(&[("email", address)])
            .header("Authorization", &self.auth_key)
            .send()
            .await;
        let response = match result {
            Ok(response) => response,
            Err(_) => {
                return Ok(ValidationOutcome::unavailable(Some(
                    UnavailableReason::Network,
                )));
            }
        };
        match response.json::<TruemailResponse>().await {
            Ok(body) => Ok(map_truemail(&body)),
            Err(_) => Ok(ValidationOutcome::unavailable(Some(
                UnavailableReason::Network,
            ))),
        }
    }
}

// ── Local generic validator ───────────────────────────────────────────────────

/// Syntax + disposable-domain + MX validation, no outbound provider.
/// SMTP handshake probing and typo correction are deliberately absent: many
/// networks block outbound port 25, and typo heuristics misfire on short TLDs.
#[derive(Clone)]
pub struct LocalChecker<R> {
    resolver: R,
    syntax: Regex,
}

impl<R: MxResolver> LocalChecker<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            syntax: Regex::new(EMAIL_SYNTAX).expect("email syntax pattern"),
        }
    }

    async fn native_code(&self, address: &str) -> Option<&'static str> {
        if !self.syntax.is_match(address) {
            return Some("regex");
        }
        let domain = match address.rsplit('@').next() {
            Some(domain) if !domain.is_empty() => domain,
            _ => return Some("regex"),
        };
        if DISPOSABLE_DOMAINS
            .iter()
            .any(|d| d.eq_ignore_ascii_case(domain))
        {
            return Some("disposable");
        }
        match self.resolver.has_mx(domain).await {
            Ok(true) => None,
            Ok(false) => Some("mx"),
            Err(_) => Some("network"),
        }
    }
}

impl<R: MxResolver> ReachabilityChecker for LocalChecker<R> {
    async fn check(&self, address: &str) -> Result<ValidationOutcome, RegistrationServiceError> {
        match self.native_code(address).await {
            None => Ok(ValidationOutcome::ok()),
            // Native codes pass through the canonical taxonomy; anything
            // unrecognized collapses to an indeterminate reason.
            Some(code) => Ok(ValidationOutcome::unavailable(
                UnavailableReason::from_code(code),
            )),
        }
    }
}

// ── MX resolution ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HickoryMxResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryMxResolver {
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }
}

impl Default for HickoryMxResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MxResolver for HickoryMxResolver {
    async fn has_mx(&self, domain: &str) -> Result<bool, anyhow::Error> {
        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => Ok(lookup.iter().next().is_some()),
            Err(e) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => Ok(false),
                _ => Err(anyhow::Error::new(e).context("mx lookup")),
            },
        }
    }
}
