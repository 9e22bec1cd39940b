use std::time::Duration;

use sea_orm::Database;
use tracing::info;

use corvid_registration::config::RegistrationConfig;
use corvid_registration::infra::reachability::EmailReachability;
use corvid_registration::router::build_router;
use corvid_registration::state::AppState;

/// Timeout for every outbound call (captcha, reachability, accounts, mail).
/// A slow provider stalls one request's handler, never the whole service.
const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    corvid_core::tracing::init_tracing();

    let config = RegistrationConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let http = reqwest::Client::builder()
        .timeout(OUTBOUND_TIMEOUT)
        .build()
        .expect("failed to build HTTP client");

    let reachability = EmailReachability::from_config(
        http.clone(),
        config.verifymail_api_key.clone(),
        config.truemail_instance.clone(),
        config.truemail_auth_key.clone(),
    );

    let state = AppState {
        db,
        http,
        policy: config.policy(),
        reachability,
        jwt_secret: config.jwt_secret,
        cookie_domain: config.cookie_domain,
        instance_url: config.instance_url,
        accounts_base_url: config.accounts_base_url,
        mail_api_url: config.mail_api_url,
        mail_api_key: config.mail_api_key,
        mail_from: config.mail_from,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.registration_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("registration service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
