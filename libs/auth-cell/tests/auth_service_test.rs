use std::sync::Arc;

use assert_matches::assert_matches;

use auth_cell::{AuthError, AuthService, RegisterRequest};
use notification_cell::{NotificationEvent, RecordingSink};
use shared_database::DocumentStore;
use shared_models::auth::{Role, SESSIONS_COLLECTION, USERS_COLLECTION};
use shared_utils::test_utils::TestBackend;

fn service(backend: &TestBackend, sink: Arc<RecordingSink>) -> AuthService {
    AuthService::new(&backend.config, backend.dyn_store(), backend.sessions.clone(), sink)
}

fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        name: "Maria Souza".to_string(),
        email: email.to_string(),
        password: "segredo1".to_string(),
    }
}

fn confirmation_token(sink: &RecordingSink) -> String {
    match sink.events().last() {
        Some(NotificationEvent::EmailConfirmation { confirmation_url, .. }) => confirmation_url
            .split("token=")
            .nth(1)
            .unwrap()
            .to_string(),
        other => panic!("expected e-mail confirmation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_register_confirm_login_logout() {
    let backend = TestBackend::new();
    let sink = Arc::new(RecordingSink::new());
    let auth = service(&backend, sink.clone());

    let user = auth.register(register_request(" Maria@Example.com ")).await.unwrap();
    assert_eq!(user.email, "maria@example.com");
    assert_eq!(user.role, Role::User);
    assert!(!user.email_verified);
    assert_eq!(sink.count_of("email_confirmation"), 1);

    let early = auth.login("maria@example.com", "segredo1").await;
    assert_matches!(early, Err(AuthError::EmailNotVerified));

    let token = confirmation_token(&sink);
    assert!(token.len() >= 32);
    let confirmed = auth.confirm_email(&token).await.unwrap();
    assert!(confirmed.email_verified);

    let login = auth.login("MARIA@example.com", "segredo1").await.unwrap();
    assert!(login.token.starts_with("session_"));
    assert_eq!(login.user.id, user.id);

    let session = backend.sessions.validate(&login.token).await.unwrap();
    let me = auth.me(&session).await.unwrap();
    assert_eq!(me.name, "Maria Souza");

    auth.logout(&session).await.unwrap();
    assert!(backend.sessions.validate(&login.token).await.is_err());
    assert_eq!(backend.store.count(SESSIONS_COLLECTION).await, 0);
}

#[tokio::test]
async fn test_confirmation_token_single_use() {
    let backend = TestBackend::new();
    let sink = Arc::new(RecordingSink::new());
    let auth = service(&backend, sink.clone());

    auth.register(register_request("pedro@example.com")).await.unwrap();
    let token = confirmation_token(&sink);

    auth.confirm_email(&token).await.unwrap();
    let again = auth.confirm_email(&token).await;
    assert_matches!(again, Err(AuthError::UnknownConfirmationToken));
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let backend = TestBackend::new();
    let auth = service(&backend, Arc::new(RecordingSink::new()));

    auth.register(register_request("ana@example.com")).await.unwrap();

    let duplicate = auth.register(register_request("ANA@example.com")).await;
    assert_matches!(duplicate, Err(AuthError::EmailTaken));

    let bad_email = auth.register(register_request("ana-at-example")).await;
    assert_matches!(bad_email, Err(AuthError::Validation(_)));

    let mut short = register_request("bia@example.com");
    short.password = "12345".to_string();
    assert_matches!(auth.register(short).await, Err(AuthError::Validation(_)));

    assert_eq!(backend.store.count(USERS_COLLECTION).await, 1);
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let backend = TestBackend::new();
    let sink = Arc::new(RecordingSink::new());
    let auth = service(&backend, sink.clone());

    auth.register(register_request("carlos@example.com")).await.unwrap();
    auth.confirm_email(&confirmation_token(&sink)).await.unwrap();

    let wrong = auth.login("carlos@example.com", "errada").await;
    let unknown = auth.login("ninguem@example.com", "segredo1").await;

    assert_matches!(wrong, Err(AuthError::InvalidCredentials));
    assert_matches!(unknown, Err(AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_ensure_admin_on_empty_store() {
    let backend = TestBackend::new();
    let auth = service(&backend, Arc::new(RecordingSink::new()));

    let admin = auth
        .ensure_admin("Sócia Fundadora", " Socia@FGJN.adv.br ", "senha-inicial")
        .await
        .unwrap();
    assert_eq!(admin.role, Role::Admin);
    assert!(admin.email_verified);
    assert_eq!(admin.email, "socia@fgjn.adv.br");

    let login = auth.login("socia@fgjn.adv.br", "senha-inicial").await.unwrap();
    let session = backend.sessions.validate(&login.token).await.unwrap();
    assert!(session.require_admin().is_ok());

    // a restart with the same settings does not duplicate the account
    let again = auth.ensure_admin("Sócia Fundadora", "socia@fgjn.adv.br", "senha-inicial").await.unwrap();
    assert_eq!(again.id, admin.id);
    assert_eq!(backend.store.count(USERS_COLLECTION).await, 1);
}

#[tokio::test]
async fn test_ensure_admin_promotes_existing_account() {
    let backend = TestBackend::new();
    let sink = Arc::new(RecordingSink::new());
    let auth = service(&backend, sink.clone());

    let user = auth.register(register_request("maria@example.com")).await.unwrap();
    let promoted = auth.ensure_admin("Ignorado", "maria@example.com", "outra-senha").await.unwrap();

    assert_eq!(promoted.id, user.id);
    assert_eq!(promoted.role, Role::Admin);
    assert!(promoted.email_verified);

    // the original password still works
    let login = auth.login("maria@example.com", "segredo1").await.unwrap();
    assert_eq!(login.user.role, Role::Admin);
}

#[tokio::test]
async fn test_ensure_admin_rejects_bad_settings() {
    let backend = TestBackend::new();
    let auth = service(&backend, Arc::new(RecordingSink::new()));

    assert_matches!(
        auth.ensure_admin("Admin", "not-an-email", "senha-inicial").await,
        Err(AuthError::Validation(_))
    );
    assert_matches!(
        auth.ensure_admin("Admin", "admin@fgjn.adv.br", "123").await,
        Err(AuthError::Validation(_))
    );
    assert_eq!(backend.store.count(USERS_COLLECTION).await, 0);
}
