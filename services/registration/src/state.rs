use sea_orm::DatabaseConnection;

use crate::domain::types::InstancePolicy;
use crate::infra::accounts::HttpAccountPort;
use crate::infra::captcha::HttpChallengeVerifier;
use crate::infra::db::{DbPendingRegistrationRepository, DbTicketRepository};
use crate::infra::mailer::HttpMailer;
use crate::infra::reachability::EmailReachability;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub http: reqwest::Client,
    pub policy: InstancePolicy,
    pub reachability: EmailReachability,
    pub jwt_secret: String,
    pub cookie_domain: String,
    pub instance_url: String,
    pub accounts_base_url: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,
}

impl AppState {
    pub fn ticket_repo(&self) -> DbTicketRepository {
        DbTicketRepository {
            db: self.db.clone(),
        }
    }

    pub fn pending_repo(&self) -> DbPendingRegistrationRepository {
        DbPendingRegistrationRepository {
            db: self.db.clone(),
        }
    }

    pub fn account_port(&self) -> HttpAccountPort {
        HttpAccountPort {
            base_url: self.accounts_base_url.clone(),
            client: self.http.clone(),
        }
    }

    pub fn challenge_verifier(&self) -> HttpChallengeVerifier {
        HttpChallengeVerifier {
            client: self.http.clone(),
        }
    }

    pub fn mailer(&self) -> HttpMailer {
        HttpMailer {
            client: self.http.clone(),
            api_url: self.mail_api_url.clone(),
            api_key: self.mail_api_key.clone(),
            from: self.mail_from.clone(),
        }
    }

    pub fn reachability(&self) -> EmailReachability {
        self.reachability.clone()
    }
}
