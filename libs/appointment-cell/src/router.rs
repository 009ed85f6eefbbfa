use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
    middleware,
};

use notification_cell::NotificationSink;
use shared_config::AppConfig;
use shared_database::DocumentStore;
use shared_utils::extractor::auth_middleware;
use shared_utils::session::SessionManager;

use crate::handlers;
use crate::services::{AvailabilityService, BookingService, DashboardService};

#[derive(Clone)]
pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub sessions: Arc<SessionManager>,
    pub notifier: Arc<dyn NotificationSink>,
}

impl AppointmentState {
    pub fn availability(&self) -> AvailabilityService {
        AvailabilityService::new(&self.config, self.store.clone())
    }

    pub fn booking(&self) -> BookingService {
        BookingService::new(&self.config, self.store.clone(), self.notifier.clone())
    }

    pub fn dashboard(&self) -> DashboardService {
        DashboardService::new(&self.config, self.store.clone())
    }
}

pub fn appointment_routes(state: AppointmentState) -> Router {
    Router::new()
        .route("/", post(handlers::request_appointment))
        .route("/available-times", get(handlers::get_available_times))
        .route("/mine", get(handlers::get_my_appointments))
        .route("/users/{user_id}", get(handlers::get_user_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment).delete(handlers::delete_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))
        .layer(middleware::from_fn_with_state(state.sessions.clone(), auth_middleware))
        .with_state(state)
}

pub fn dashboard_routes(state: AppointmentState) -> Router {
    Router::new()
        .route("/", get(handlers::admin_dashboard))
        .route("/clients", get(handlers::clients_overview))
        .layer(middleware::from_fn_with_state(state.sessions.clone(), auth_middleware))
        .with_state(state)
}
