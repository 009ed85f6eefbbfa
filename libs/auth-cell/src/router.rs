use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use notification_cell::NotificationSink;
use shared_config::AppConfig;
use shared_database::DocumentStore;
use shared_utils::extractor::auth_middleware;
use shared_utils::session::SessionManager;

use crate::handlers;
use crate::services::auth::AuthService;

#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub sessions: Arc<SessionManager>,
    pub notifier: Arc<dyn NotificationSink>,
}

impl AuthState {
    pub fn service(&self) -> AuthService {
        AuthService::new(&self.config, self.store.clone(), self.sessions.clone(), self.notifier.clone())
    }
}

pub fn auth_routes(state: AuthState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/confirm-email", post(handlers::confirm_email))
        .route("/login", post(handlers::login));

    let protected_routes = Router::new()
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
        .layer(middleware::from_fn_with_state(state.sessions.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
