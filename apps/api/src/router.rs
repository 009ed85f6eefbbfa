use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::{appointment_routes, dashboard_routes, AppointmentState};
use auth_cell::{auth_routes, AuthState};
use lawyer_cell::{lawyer_routes, LawyerState};
use notification_cell::NotificationSink;
use shared_config::AppConfig;
use shared_database::DocumentStore;
use shared_utils::session::SessionManager;

/// Process-wide handles every cell state is built from.
#[derive(Clone)]
pub struct AppServices {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub sessions: Arc<SessionManager>,
    pub notifier: Arc<dyn NotificationSink>,
}

pub fn create_router(services: AppServices) -> Router {
    let auth = AuthState {
        config: services.config.clone(),
        store: services.store.clone(),
        sessions: services.sessions.clone(),
        notifier: services.notifier.clone(),
    };

    let lawyers = LawyerState {
        config: services.config.clone(),
        store: services.store.clone(),
        sessions: services.sessions.clone(),
    };

    let appointments = AppointmentState {
        config: services.config,
        store: services.store,
        sessions: services.sessions,
        notifier: services.notifier,
    };

    Router::new()
        .route("/", get(|| async { "Law office appointment API is running!" }))
        .nest("/auth", auth_routes(auth))
        .nest("/lawyers", lawyer_routes(lawyers))
        .nest("/appointments", appointment_routes(appointments.clone()))
        .nest("/dashboard", dashboard_routes(appointments))
}
