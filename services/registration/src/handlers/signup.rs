use axum::response::{IntoResponse, Response};
use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::cookie::{set_access_token_cookie, set_refresh_token_cookie};
use crate::domain::types::CreatedAccount;
use crate::error::RegistrationServiceError;
use crate::state::AppState;
use crate::usecase::complete::{CompleteSignupInput, CompleteSignupUseCase};
use crate::usecase::gate::SignupRequest;
use crate::usecase::signup::{SignupOutcome, SignupUseCase};

#[derive(Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub host: String,
    #[serde(serialize_with = "corvid_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<CreatedAccount> for AccountResponse {
    fn from(account: CreatedAccount) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username,
            host: account.host,
            created_at: account.created_at,
        }
    }
}

// ── POST /signup ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignupBody {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub invitation_code: Option<String>,
    pub hcaptcha_response: Option<String>,
    pub recaptcha_response: Option<String>,
    pub turnstile_response: Option<String>,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub account: AccountResponse,
    /// Credential secret, issued exactly once at creation.
    pub secret: String,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupBody>,
) -> Result<Response, RegistrationServiceError> {
    let usecase = SignupUseCase {
        tickets: state.ticket_repo(),
        pendings: state.pending_repo(),
        accounts: state.account_port(),
        reachability: state.reachability(),
        challenge: state.challenge_verifier(),
        mailer: state.mailer(),
        policy: state.policy.clone(),
        instance_url: state.instance_url.clone(),
    };
    let outcome = usecase
        .execute(SignupRequest {
            username: body.username,
            password: body.password,
            email: body.email,
            invitation_code: body.invitation_code,
            hcaptcha_response: body.hcaptcha_response,
            recaptcha_response: body.recaptcha_response,
            turnstile_response: body.turnstile_response,
        })
        .await?;

    Ok(match outcome {
        SignupOutcome::Created { account, secret } => (
            StatusCode::OK,
            Json(SignupResponse {
                account: account.into(),
                secret,
            }),
        )
            .into_response(),
        // No account exists yet and no secret leaves the service; the
        // client learns nothing beyond "check your email".
        SignupOutcome::Pending => StatusCode::NO_CONTENT.into_response(),
    })
}

// ── POST /signup/complete ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CompleteSignupBody {
    pub code: String,
}

pub async fn complete_signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<CompleteSignupBody>,
) -> Result<impl IntoResponse, RegistrationServiceError> {
    let usecase = CompleteSignupUseCase {
        pendings: state.pending_repo(),
        tickets: state.ticket_repo(),
        accounts: state.account_port(),
        host: state.policy.host.clone(),
        jwt_secret: state.jwt_secret.clone(),
    };
    let out = usecase
        .execute(CompleteSignupInput { code: body.code })
        .await?;

    let jar = set_access_token_cookie(jar, out.access_token, state.cookie_domain.clone());
    let jar = set_refresh_token_cookie(jar, out.refresh_token, state.cookie_domain.clone());

    Ok((
        StatusCode::OK,
        jar,
        Json(AccountResponse::from(out.account)),
    ))
}
