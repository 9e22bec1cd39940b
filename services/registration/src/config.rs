use crate::domain::types::{CaptchaConfig, CaptchaProvider, InstancePolicy};

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.as_str(), "1" | "true"))
        .unwrap_or(default)
}

fn env_csv(name: &str) -> Vec<String> {
    std::env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Registration service configuration loaded from environment variables.
#[derive(Debug)]
pub struct RegistrationConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for signing session JWTs.
    pub jwt_secret: String,
    /// Cookie domain attribute (root domain, e.g. "corvid.example").
    pub cookie_domain: String,
    /// TCP port to listen on (default 3114). Env var: `REGISTRATION_PORT`.
    pub registration_port: u16,
    /// Hostname local accounts are created under. Env var: `INSTANCE_HOST`.
    pub instance_host: String,
    /// Public base URL, used for confirmation links. Env var: `INSTANCE_URL`.
    pub instance_url: String,
    /// Account service internal API base URL. Env var: `ACCOUNTS_BASE_URL`.
    pub accounts_base_url: String,
    /// Transactional mail API base URL, key and From address.
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,
    /// Reachability strategy keys; precedence: Verifymail, then Truemail,
    /// then the local validator.
    pub verifymail_api_key: Option<String>,
    pub truemail_instance: Option<String>,
    pub truemail_auth_key: Option<String>,
    /// Bot-challenge provider secrets; each configured one is verified.
    pub hcaptcha_secret: Option<String>,
    pub recaptcha_secret: Option<String>,
    pub turnstile_secret: Option<String>,
    /// Instance policy flags.
    pub registration_open: bool,
    pub email_required: bool,
    pub reserved_usernames: Vec<String>,
    pub banned_email_domains: Vec<String>,
    pub captcha_test_mode: bool,
}

impl RegistrationConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            cookie_domain: std::env::var("COOKIE_DOMAIN").expect("COOKIE_DOMAIN"),
            registration_port: std::env::var("REGISTRATION_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3114),
            instance_host: std::env::var("INSTANCE_HOST").expect("INSTANCE_HOST"),
            instance_url: std::env::var("INSTANCE_URL").expect("INSTANCE_URL"),
            accounts_base_url: std::env::var("ACCOUNTS_BASE_URL").expect("ACCOUNTS_BASE_URL"),
            mail_api_url: std::env::var("MAIL_API_URL").expect("MAIL_API_URL"),
            mail_api_key: std::env::var("MAIL_API_KEY").expect("MAIL_API_KEY"),
            mail_from: std::env::var("MAIL_FROM").expect("MAIL_FROM"),
            verifymail_api_key: std::env::var("VERIFYMAIL_API_KEY").ok(),
            truemail_instance: std::env::var("TRUEMAIL_INSTANCE").ok(),
            truemail_auth_key: std::env::var("TRUEMAIL_AUTH_KEY").ok(),
            hcaptcha_secret: std::env::var("HCAPTCHA_SECRET").ok(),
            recaptcha_secret: std::env::var("RECAPTCHA_SECRET").ok(),
            turnstile_secret: std::env::var("TURNSTILE_SECRET").ok(),
            registration_open: env_bool("REGISTRATION_OPEN", true),
            email_required: env_bool("EMAIL_REQUIRED", false),
            reserved_usernames: env_csv("RESERVED_USERNAMES"),
            banned_email_domains: env_csv("BANNED_EMAIL_DOMAINS"),
            captcha_test_mode: env_bool("CAPTCHA_TEST_MODE", false),
        }
    }

    /// Snapshot of the instance-wide registration policy.
    pub fn policy(&self) -> InstancePolicy {
        let mut captcha = Vec::new();
        if let Some(secret) = &self.hcaptcha_secret {
            captcha.push(CaptchaConfig {
                provider: CaptchaProvider::Hcaptcha,
                secret: secret.clone(),
            });
        }
        if let Some(secret) = &self.recaptcha_secret {
            captcha.push(CaptchaConfig {
                provider: CaptchaProvider::Recaptcha,
                secret: secret.clone(),
            });
        }
        if let Some(secret) = &self.turnstile_secret {
            captcha.push(CaptchaConfig {
                provider: CaptchaProvider::Turnstile,
                secret: secret.clone(),
            });
        }
        InstancePolicy {
            host: self.instance_host.clone(),
            registration_open: self.registration_open,
            email_required: self.email_required,
            reserved_usernames: self.reserved_usernames.clone(),
            banned_email_domains: self.banned_email_domains.clone(),
            captcha,
            captcha_test_mode: self.captcha_test_mode,
        }
    }
}
