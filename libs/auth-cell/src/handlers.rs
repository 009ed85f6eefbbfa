use axum::{
    extract::{Extension, Json, State},
};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::auth::SessionContext;
use shared_models::error::AppError;

use crate::models::{ConfirmEmailRequest, LoginRequest, RegisterRequest};
use crate::router::AuthState;

#[axum::debug_handler]
pub async fn register(
    State(state): State<AuthState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    let user = state.service().register(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Account created. Check your e-mail to confirm it.",
        "user": user
    })))
}

#[axum::debug_handler]
pub async fn confirm_email(
    State(state): State<AuthState>,
    Json(request): Json<ConfirmEmailRequest>,
) -> Result<Json<Value>, AppError> {
    let user = state.service().confirm_email(&request.token).await?;

    Ok(Json(json!({
        "success": true,
        "message": "E-mail confirmed",
        "user": user
    })))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AuthState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let login = state.service().login(&request.email, &request.password).await?;

    Ok(Json(json!({
        "success": true,
        "token": login.token,
        "expiresAt": login.expires_at,
        "user": login.user
    })))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AuthState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Value>, AppError> {
    state.service().logout(&session).await?;

    Ok(Json(json!({ "success": true })))
}

#[axum::debug_handler]
pub async fn me(
    State(state): State<AuthState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Value>, AppError> {
    debug!("Getting profile for user: {}", session.user_id);
    let user = state.service().me(&session).await?;

    Ok(Json(json!({
        "success": true,
        "user": user
    })))
}
