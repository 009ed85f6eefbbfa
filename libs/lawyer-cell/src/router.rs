use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    middleware,
};

use shared_config::AppConfig;
use shared_database::DocumentStore;
use shared_utils::extractor::auth_middleware;
use shared_utils::session::SessionManager;

use crate::handlers;
use crate::services::LawyerService;

#[derive(Clone)]
pub struct LawyerState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub sessions: Arc<SessionManager>,
}

impl LawyerState {
    pub fn service(&self) -> LawyerService {
        LawyerService::new(&self.config, self.store.clone(), self.sessions.clone())
    }
}

pub fn lawyer_routes(state: LawyerState) -> Router {
    Router::new()
        .route("/", get(handlers::list_lawyers).post(handlers::upsert_lawyer))
        .route("/{lawyer_id}", get(handlers::get_lawyer).delete(handlers::delete_lawyer))
        .layer(middleware::from_fn_with_state(state.sessions.clone(), auth_middleware))
        .with_state(state)
}
