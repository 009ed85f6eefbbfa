use std::sync::Arc;
use chrono::{Duration, Utc};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{store::to_document, DocumentStore, InMemoryDocumentStore};
use shared_models::auth::{Role, SessionContext, SessionRecord, UserRecord, SESSIONS_COLLECTION, USERS_COLLECTION};

use crate::session::{issue_token, SessionManager};

pub struct TestConfig {
    pub session_secret: String,
    pub business_utc_offset_minutes: i32,
    pub app_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            session_secret: "test-secret-key-for-session-signing-must-be-long-enough".to_string(),
            business_utc_offset_minutes: -180,
            app_base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            session_secret: self.session_secret.clone(),
            business_utc_offset_minutes: self.business_utc_offset_minutes,
            app_base_url: self.app_base_url.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// In-memory store plus a session manager wired to it.
pub struct TestBackend {
    pub config: Arc<AppConfig>,
    pub store: Arc<InMemoryDocumentStore>,
    pub sessions: Arc<SessionManager>,
}

impl TestBackend {
    pub fn new() -> Self {
        let config = TestConfig::default().to_arc();
        let store = Arc::new(InMemoryDocumentStore::new());
        let sessions = Arc::new(SessionManager::new(
            store.clone(),
            config.session_secret.clone(),
            config.session_ttl_hours,
        ));

        Self { config, store, sessions }
    }

    pub fn dyn_store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    pub async fn seed_user(&self, user: &TestUser) -> UserRecord {
        let record = user.to_record();
        self.store
            .insert(USERS_COLLECTION, &record.id, to_document(&record).expect("user serializes"))
            .await
            .expect("seed user");
        record
    }

    /// Seeds the user and opens a session for it; returns the bearer token.
    pub async fn login(&self, user: &TestUser) -> String {
        self.seed_user(user).await;
        self.sessions
            .create_session(&user.id, user.role)
            .await
            .expect("create session")
            .token
    }

    pub async fn expired_session(&self, user: &TestUser) -> String {
        let token = issue_token(&self.config.session_secret).expect("issue token");
        let record = SessionRecord {
            token: token.clone(),
            user_id: user.id.clone(),
            role: user.role,
            expires_at: Utc::now() - Duration::hours(1),
            created_at: Utc::now() - Duration::hours(2),
        };
        self.store
            .insert(SESSIONS_COLLECTION, &token, to_document(&record).expect("session serializes"))
            .await
            .expect("seed session");
        token
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TestUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(name: &str, email: &str, role: Role) -> Self {
        Self {
            id: format!("user_{}", Uuid::new_v4().simple()),
            name: name.to_string(),
            email: email.to_string(),
            role,
        }
    }

    pub fn client(email: &str) -> Self {
        Self::new("Test Client", email, Role::User)
    }

    pub fn admin(email: &str) -> Self {
        Self::new("Test Lawyer", email, Role::Admin)
    }

    pub fn to_record(&self) -> UserRecord {
        UserRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            password_hash: "not-a-real-hash".to_string(),
            role: self.role,
            email_verified: true,
            verification_token: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn to_session(&self) -> SessionContext {
        SessionContext {
            user_id: self.id.clone(),
            role: self.role,
            token: format!("session_test_{}", self.id),
        }
    }
}

pub fn forged_token() -> String {
    issue_token("wrong-secret").expect("issue token")
}
