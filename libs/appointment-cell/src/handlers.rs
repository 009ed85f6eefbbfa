use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::SessionContext;
use shared_models::error::AppError;

use crate::models::{AvailableTimesQuery, RequestAppointmentRequest, UpdateStatusRequest};
use crate::router::AppointmentState;

#[axum::debug_handler]
pub async fn get_available_times(
    State(state): State<AppointmentState>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<AvailableTimesQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = state
        .availability()
        .get_available_times(&session, &query.lawyer_id, &query.date)
        .await?;

    Ok(Json(json!({
        "success": true,
        "lawyerId": query.lawyer_id,
        "date": query.date,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn request_appointment(
    State(state): State<AppointmentState>,
    Extension(session): Extension<SessionContext>,
    Json(request): Json<RequestAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = state.booking().request_appointment(&session, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment requested successfully",
        "appointmentId": appointment_id
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppointmentState>,
    Extension(session): Extension<SessionContext>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.booking().get_appointment(&session, &appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<AppointmentState>,
    Extension(session): Extension<SessionContext>,
    Path(appointment_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let update = state
        .booking()
        .update_appointment_status(&session, &appointment_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": update.message,
        "appointment": update.appointment
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<AppointmentState>,
    Extension(session): Extension<SessionContext>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.booking().delete_appointment(&session, &appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment deleted successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<AppointmentState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Value>, AppError> {
    let grouped = state.dashboard().user_appointments(&session, &session.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointments": grouped
    })))
}

#[axum::debug_handler]
pub async fn get_user_appointments(
    State(state): State<AppointmentState>,
    Extension(session): Extension<SessionContext>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let grouped = state.dashboard().user_appointments(&session, &user_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointments": grouped
    })))
}

#[axum::debug_handler]
pub async fn admin_dashboard(
    State(state): State<AppointmentState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Value>, AppError> {
    let dashboard = state.dashboard().admin_dashboard(&session).await?;

    Ok(Json(json!({
        "success": true,
        "dashboard": dashboard
    })))
}

#[axum::debug_handler]
pub async fn clients_overview(
    State(state): State<AppointmentState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Value>, AppError> {
    let overview = state.dashboard().clients_overview(&session).await?;

    Ok(Json(json!({
        "success": true,
        "clients": overview.clients,
        "totalClients": overview.total_clients,
        "totalAppointments": overview.total_appointments,
        "totalPending": overview.total_pending,
        "totalConfirmed": overview.total_confirmed
    })))
}
