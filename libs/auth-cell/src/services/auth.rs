use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use notification_cell::{NotificationEvent, NotificationSink};
use shared_config::AppConfig;
use shared_database::{
    store::{from_document, to_document},
    DocumentStore, Filter, StoreError,
};
use shared_models::auth::{Role, SessionContext, User, UserRecord, USERS_COLLECTION};
use shared_utils::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use shared_utils::session::SessionManager;
use shared_utils::validation::{is_valid_email, normalize_email};

use crate::models::{AuthError, LoginResponse, RegisterRequest};

pub struct AuthService {
    store: Arc<dyn DocumentStore>,
    sessions: Arc<SessionManager>,
    notifier: Arc<dyn NotificationSink>,
    app_base_url: String,
}

impl AuthService {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn DocumentStore>,
        sessions: Arc<SessionManager>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            sessions,
            notifier,
            app_base_url: config.app_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn find_user(&self, filter: Filter) -> Result<Option<UserRecord>, AuthError> {
        let documents = self.store.query(USERS_COLLECTION, &[filter], None).await?;
        match documents.into_iter().next() {
            Some(document) => Ok(Some(from_document(document)?)),
            None => Ok(None),
        }
    }

    /// Creates an unverified client account and queues the confirmation e-mail.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AuthError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }

        if !is_valid_email(&request.email) {
            return Err(AuthError::Validation("Invalid e-mail".to_string()));
        }
        let email = normalize_email(&request.email);

        if request.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "Password must have at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let password_hash = hash_password(&request.password)
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

        let verification_token = Uuid::new_v4().simple().to_string();
        let user = UserRecord {
            id: format!("user_{}", Uuid::new_v4().simple()),
            name: name.to_string(),
            email: email.clone(),
            password_hash,
            role: Role::User,
            email_verified: false,
            verification_token: Some(verification_token.clone()),
            created_at: Utc::now(),
            updated_at: None,
        };

        match self.store
            .insert_unique(USERS_COLLECTION, &user.id, to_document(&user)?, &[Filter::eq("email", email.as_str())])
            .await
        {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        }

        self.notifier.notify(NotificationEvent::EmailConfirmation {
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            confirmation_url: format!("{}/confirm-email?token={}", self.app_base_url, verification_token),
        });

        info!("User {} registered", user.id);
        Ok(user.to_public())
    }

    /// Makes sure a verified administrator exists for `email`. An existing account
    /// is promoted and keeps its password; otherwise one is created.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn ensure_admin(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        if !is_valid_email(email) {
            return Err(AuthError::Validation("Invalid administrator e-mail".to_string()));
        }
        let email = normalize_email(email);

        if let Some(existing) = self.find_user(Filter::eq("email", email.as_str())).await? {
            return self.promote_to_admin(existing).await;
        }

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "Password must have at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let password_hash = hash_password(password)
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

        let name = name.trim();
        let admin = UserRecord {
            id: format!("user_{}", Uuid::new_v4().simple()),
            name: if name.is_empty() { "Administrador".to_string() } else { name.to_string() },
            email: email.clone(),
            password_hash,
            role: Role::Admin,
            email_verified: true,
            verification_token: None,
            created_at: Utc::now(),
            updated_at: None,
        };

        match self.store
            .insert_unique(USERS_COLLECTION, &admin.id, to_document(&admin)?, &[Filter::eq("email", email.as_str())])
            .await
        {
            Ok(()) => {
                info!("Administrator {} created", admin.id);
                Ok(admin.to_public())
            }
            Err(StoreError::Conflict(_)) => {
                let existing = self
                    .find_user(Filter::eq("email", email.as_str()))
                    .await?
                    .ok_or(AuthError::UserNotFound)?;
                self.promote_to_admin(existing).await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn promote_to_admin(&self, user: UserRecord) -> Result<User, AuthError> {
        if user.role == Role::Admin && user.email_verified {
            debug!("Administrator {} already present", user.id);
            return Ok(user.to_public());
        }

        let patch = json!({
            "role": Role::Admin,
            "emailVerified": true,
            "verificationToken": Value::Null,
            "updatedAt": Utc::now(),
        });
        let updated: UserRecord = from_document(self.store.update(USERS_COLLECTION, &user.id, patch, &[]).await?)?;

        warn!("User {} promoted to administrator", updated.id);
        Ok(updated.to_public())
    }

    #[instrument(skip(self, token))]
    pub async fn confirm_email(&self, token: &str) -> Result<User, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::UnknownConfirmationToken);
        }

        let user = self
            .find_user(Filter::eq("verificationToken", token))
            .await?
            .ok_or(AuthError::UnknownConfirmationToken)?;

        let patch = json!({
            "emailVerified": true,
            "verificationToken": Value::Null,
            "updatedAt": Utc::now(),
        });

        let updated = match self.store
            .update(USERS_COLLECTION, &user.id, patch, &[Filter::eq("verificationToken", token)])
            .await
        {
            Ok(document) => document,
            Err(StoreError::Conflict(_)) | Err(StoreError::NotFound(_)) => {
                return Err(AuthError::UnknownConfirmationToken)
            }
            Err(e) => return Err(e.into()),
        };

        let user: UserRecord = from_document(updated)?;
        info!("E-mail confirmed for user {}", user.id);
        Ok(user.to_public())
    }

    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        if !is_valid_email(email) || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .find_user(Filter::eq("email", normalize_email(email)))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password_ok = verify_password(password, &user.password_hash).unwrap_or_else(|e| {
            warn!("Stored password hash for {} is unreadable: {}", user.id, e);
            false
        });
        if !password_ok {
            debug!("Wrong password for {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        if !user.email_verified {
            return Err(AuthError::EmailNotVerified);
        }

        let session = self.sessions.create_session(&user.id, user.role).await?;

        info!("User {} signed in", user.id);
        Ok(LoginResponse {
            token: session.token,
            expires_at: session.expires_at,
            user: user.to_public(),
        })
    }

    pub async fn logout(&self, session: &SessionContext) -> Result<(), AuthError> {
        self.sessions.revoke(&session.token).await?;
        debug!("Session closed for {}", session.user_id);
        Ok(())
    }

    pub async fn me(&self, session: &SessionContext) -> Result<User, AuthError> {
        let document = self.store
            .get(USERS_COLLECTION, &session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let user: UserRecord = from_document(document)?;
        Ok(user.to_public())
    }
}
