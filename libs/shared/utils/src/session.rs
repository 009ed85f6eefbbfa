use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, error, warn};
use uuid::Uuid;

use shared_database::{store::{from_document, to_document}, DocumentStore, Filter, StoreError};
use shared_models::auth::{Role, SessionContext, SessionRecord, SESSIONS_COLLECTION};
use shared_models::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_PREFIX: &str = "session_";

fn sign(payload: &str, secret: &str) -> Result<String, String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(payload.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// Opaque session token: `session_<uuid>.<base64url hmac-sha256 of the id>`.
pub fn issue_token(secret: &str) -> Result<String, String> {
    if secret.is_empty() {
        return Err("Session secret is not set".to_string());
    }

    let id = format!("{}{}", TOKEN_PREFIX, Uuid::new_v4().simple());
    let signature = sign(&id, secret)?;
    Ok(format!("{}.{}", id, signature))
}

/// Checks the token shape and signature without touching the store.
pub fn verify_token_signature(token: &str, secret: &str) -> Result<(), String> {
    if secret.is_empty() {
        return Err("Session secret is not set".to_string());
    }

    let (id, signature_b64) = token
        .split_once('.')
        .ok_or_else(|| "Invalid token format".to_string())?;

    if !id.starts_with(TOKEN_PREFIX) || signature_b64.is_empty() {
        return Err("Invalid token format".to_string());
    }

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(id.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    Ok(())
}

fn store_failure(err: StoreError) -> AppError {
    AppError::DependencyFailure(format!("session store: {}", err))
}

/// Issues, validates and revokes sessions held in the `sessions` collection.
pub struct SessionManager {
    store: Arc<dyn DocumentStore>,
    secret: String,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn DocumentStore>, secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            store,
            secret: secret.into(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub async fn create_session(&self, user_id: &str, role: Role) -> Result<SessionRecord, AppError> {
        let token = issue_token(&self.secret).map_err(|e| {
            error!("Cannot issue session token: {}", e);
            AppError::DependencyFailure(e)
        })?;

        let now = Utc::now();
        let record = SessionRecord {
            token: token.clone(),
            user_id: user_id.to_string(),
            role,
            expires_at: now + self.ttl,
            created_at: now,
        };

        let document = to_document(&record).map_err(store_failure)?;
        self.store
            .insert(SESSIONS_COLLECTION, &token, document)
            .await
            .map_err(store_failure)?;

        debug!("Session created for user {}", user_id);
        Ok(record)
    }

    pub async fn validate(&self, token: &str) -> Result<SessionContext, AppError> {
        verify_token_signature(token, &self.secret).map_err(AppError::Unauthenticated)?;

        let document = self.store
            .get(SESSIONS_COLLECTION, token)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| AppError::Unauthenticated("Session not found".to_string()))?;

        let record: SessionRecord = from_document(document).map_err(store_failure)?;

        if record.is_expired(Utc::now()) {
            warn!("Expired session used by user {}", record.user_id);
            if let Err(e) = self.store.delete(SESSIONS_COLLECTION, token).await {
                warn!("Failed to purge expired session: {}", e);
            }
            return Err(AppError::Unauthenticated("Session expired".to_string()));
        }

        Ok(SessionContext::from(&record))
    }

    pub async fn revoke(&self, token: &str) -> Result<(), AppError> {
        self.store
            .delete(SESSIONS_COLLECTION, token)
            .await
            .map_err(store_failure)?;
        Ok(())
    }

    /// Drops every session of a user, e.g. when the account is deleted.
    pub async fn revoke_all_for_user(&self, user_id: &str) -> Result<usize, AppError> {
        let sessions = self.store
            .query(SESSIONS_COLLECTION, &[Filter::eq("userId", user_id)], None)
            .await
            .map_err(store_failure)?;

        let mut removed = 0;
        for session in sessions {
            if let Some(token) = session.get("token").and_then(|t| t.as_str()) {
                if self.store.delete(SESSIONS_COLLECTION, token).await.map_err(store_failure)? {
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_verifies() {
        let token = issue_token("secret").unwrap();
        assert!(token.starts_with("session_"));
        assert!(verify_token_signature(&token, "secret").is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token("secret").unwrap();
        assert_eq!(
            verify_token_signature(&token, "other").unwrap_err(),
            "Invalid token signature"
        );
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        assert!(verify_token_signature("garbage", "secret").is_err());
        assert!(verify_token_signature("session_abc.", "secret").is_err());
        assert!(verify_token_signature("other_abc.c2ln", "secret").is_err());
    }

    #[test]
    fn test_empty_secret_refused() {
        assert!(issue_token("").is_err());
    }
}
