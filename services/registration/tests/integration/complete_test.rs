use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use corvid_registration::domain::types::PendingRegistration;
use corvid_registration::error::RegistrationServiceError;
use corvid_registration::usecase::complete::{CompleteSignupInput, CompleteSignupUseCase};
use corvid_registration::usecase::session::TokenClaims;

use crate::helpers::*;

const JWT_SECRET: &str = "test-secret";

fn pending(code: &str) -> PendingRegistration {
    PendingRegistration::new(
        "alice".to_owned(),
        "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g".to_owned(),
        "alice@example.com".to_owned(),
        code.to_owned(),
    )
}

fn usecase(
    pendings: MockPendingRepo,
    tickets: MockTicketRepo,
    accounts: MockAccountPort,
) -> CompleteSignupUseCase<MockPendingRepo, MockTicketRepo, MockAccountPort> {
    CompleteSignupUseCase {
        pendings,
        tickets,
        accounts,
        host: "corvid.example".to_owned(),
        jwt_secret: JWT_SECRET.to_owned(),
    }
}

#[tokio::test]
async fn should_complete_pending_signup() {
    let row = pending("abcdefghjkmnpqrs");
    let mut ticket = fresh_ticket("invite-1");
    ticket.used_at = Some(Utc::now() - Duration::minutes(2));
    ticket.pending_registration_id = Some(row.id);
    let ticket_id = ticket.id;

    let pendings = MockPendingRepo::new(vec![row.clone()]);
    let tickets = MockTicketRepo::new(vec![ticket]);
    let accounts = MockAccountPort::new();
    let created = accounts.created.clone();
    let confirmed = accounts.confirmed.clone();
    let usecase = usecase(pendings.clone(), tickets.clone(), accounts);

    let out = usecase
        .execute(CompleteSignupInput {
            code: "abcdefghjkmnpqrs".to_owned(),
        })
        .await
        .unwrap();

    assert_eq!(out.account.username, "alice");
    assert_eq!(out.account.host, "corvid.example");

    // Stored hash goes through untouched.
    let created = created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].password_hash, row.password_hash);

    // Email confirmed against the address the code was sent to.
    let confirmed = confirmed.lock().unwrap();
    assert_eq!(confirmed.as_slice(), &[(out.account.id, row.email.clone())]);

    // The backing ticket is permanently consumed.
    let stored = tickets.get(ticket_id);
    assert_eq!(stored.used_by, Some(out.account.id));
    assert!(stored.pending_registration_id.is_none());

    // The pending row is gone.
    assert_eq!(pendings.count(), 0);

    // Session tokens name the new account.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);
    let claims = decode::<TokenClaims>(
        &out.access_token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &validation,
    )
    .unwrap()
    .claims;
    assert_eq!(claims.sub, out.account.id.to_string());
    assert_eq!(claims.exp, out.access_token_exp);
    assert_ne!(out.access_token, out.refresh_token);
}

#[tokio::test]
async fn should_reject_unknown_code() {
    let usecase = usecase(
        MockPendingRepo::empty(),
        MockTicketRepo::empty(),
        MockAccountPort::new(),
    );

    let err = usecase
        .execute(CompleteSignupInput {
            code: "nosuchcode".to_owned(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationServiceError::PendingNotFound));
}

#[tokio::test]
async fn should_reject_expired_code_without_deleting_the_row() {
    let mut row = pending("abcdefghjkmnpqrs");
    row.created_at = Utc::now() - Duration::minutes(31);
    let pendings = MockPendingRepo::new(vec![row]);
    let accounts = MockAccountPort::new();
    let created = accounts.created.clone();
    let usecase = usecase(pendings.clone(), MockTicketRepo::empty(), accounts);

    let err = usecase
        .execute(CompleteSignupInput {
            code: "abcdefghjkmnpqrs".to_owned(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationServiceError::PendingExpired));
    assert!(created.lock().unwrap().is_empty());
    // Expiry is passive; the row lingers until something deletes it.
    assert_eq!(pendings.count(), 1);
}

#[tokio::test]
async fn should_reject_code_at_exactly_thirty_minutes() {
    let mut row = pending("abcdefghjkmnpqrs");
    row.created_at = Utc::now() - Duration::minutes(30);
    let pendings = MockPendingRepo::new(vec![row]);
    let usecase = usecase(pendings, MockTicketRepo::empty(), MockAccountPort::new());

    let err = usecase
        .execute(CompleteSignupInput {
            code: "abcdefghjkmnpqrs".to_owned(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationServiceError::PendingExpired));
}

#[tokio::test]
async fn should_reject_second_redemption() {
    let row = pending("abcdefghjkmnpqrs");
    let pendings = MockPendingRepo::new(vec![row]);
    let accounts = MockAccountPort::new();
    let created = accounts.created.clone();
    let usecase = usecase(pendings, MockTicketRepo::empty(), accounts);

    usecase
        .execute(CompleteSignupInput {
            code: "abcdefghjkmnpqrs".to_owned(),
        })
        .await
        .unwrap();
    let err = usecase
        .execute(CompleteSignupInput {
            code: "abcdefghjkmnpqrs".to_owned(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationServiceError::PendingNotFound));
    assert_eq!(created.lock().unwrap().len(), 1);
}
