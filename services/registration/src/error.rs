use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::types::UnavailableReason;

/// Closed set of account-creation rejection causes. The account service's
/// raw error detail is logged server-side and never forwarded to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRejectCause {
    Duplicate,
    InvalidInput,
    Policy,
}

impl AccountRejectCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::InvalidInput => "invalid input",
            Self::Policy => "policy",
        }
    }
}

/// Registration service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationServiceError {
    #[error("invalid challenge response")]
    InvalidChallenge,
    #[error("email address unavailable")]
    EmailUnavailable(Option<UnavailableReason>),
    #[error("username already taken")]
    DuplicatedUsername,
    #[error("username was previously used")]
    UsedUsername,
    #[error("username not allowed")]
    DeniedUsername,
    #[error("invalid or expired invitation code")]
    InvalidTicket,
    #[error("unknown confirmation code")]
    PendingNotFound,
    #[error("confirmation code expired")]
    PendingExpired,
    #[error("account creation rejected: {}", .0.as_str())]
    AccountRejected(AccountRejectCause),
    #[error("mail transport failure")]
    MailTransport(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl RegistrationServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidChallenge => "INVALID_CHALLENGE",
            Self::EmailUnavailable(_) => "EMAIL_UNAVAILABLE",
            Self::DuplicatedUsername => "DUPLICATED_USERNAME",
            Self::UsedUsername => "USED_USERNAME",
            Self::DeniedUsername => "DENIED_USERNAME",
            Self::InvalidTicket => "INVALID_TICKET",
            Self::PendingNotFound => "UNKNOWN_CODE",
            Self::PendingExpired => "EXPIRED_CODE",
            Self::AccountRejected(_) => "ACCOUNT_REJECTED",
            Self::MailTransport(_) => "MAIL_TRANSPORT",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for RegistrationServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidChallenge
            | Self::EmailUnavailable(_)
            | Self::DuplicatedUsername
            | Self::UsedUsername
            | Self::DeniedUsername
            | Self::InvalidTicket
            | Self::PendingNotFound
            | Self::PendingExpired
            | Self::AccountRejected(_) => StatusCode::BAD_REQUEST,
            Self::MailTransport(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Log 500s only — tower-http TraceLayer already records method/uri/status
        // for every request, and 4xx are expected client rejections.
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = %e, kind = "INTERNAL", "internal error");
            }
            Self::MailTransport(e) => {
                tracing::error!(error = %e, kind = "MAIL_TRANSPORT", "mail transport failure");
            }
            _ => {}
        }
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        // Rejections stay terse cause codes; the email variant additionally
        // carries the canonical reachability reason (null = indeterminate).
        if let Self::EmailUnavailable(reason) = &self {
            body["reason"] = serde_json::json!(reason);
        }
        (status, axum::Json(body)).into_response()
    }
}
