use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::cookie::{ACCESS_TOKEN_EXP, REFRESH_TOKEN_EXP};
use crate::error::RegistrationServiceError;

/// JWT claims for both access and refresh tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

fn issue(account_id: Uuid, secret: &str, ttl: u64) -> Result<(String, u64), RegistrationServiceError> {
    let exp = now_secs() + ttl;
    let claims = TokenClaims {
        sub: account_id.to_string(),
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| RegistrationServiceError::Internal(e.into()))?;
    Ok((token, exp))
}

pub fn issue_access_token(
    account_id: Uuid,
    secret: &str,
) -> Result<(String, u64), RegistrationServiceError> {
    issue(account_id, secret, ACCESS_TOKEN_EXP)
}

pub fn issue_refresh_token(
    account_id: Uuid,
    secret: &str,
) -> Result<String, RegistrationServiceError> {
    issue(account_id, secret, REFRESH_TOKEN_EXP).map(|(token, _)| token)
}
