use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::SessionContext;
use shared_models::error::AppError;

use crate::models::UpsertLawyerRequest;
use crate::router::LawyerState;

#[axum::debug_handler]
pub async fn list_lawyers(
    State(state): State<LawyerState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Value>, AppError> {
    let lawyers = state.service().list_lawyers(&session).await?;

    Ok(Json(json!({
        "success": true,
        "lawyers": lawyers,
        "total": lawyers.len()
    })))
}

#[axum::debug_handler]
pub async fn get_lawyer(
    State(state): State<LawyerState>,
    Extension(session): Extension<SessionContext>,
    Path(lawyer_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let lawyer = state.service().get_lawyer(&session, &lawyer_id).await?;

    Ok(Json(json!({
        "success": true,
        "lawyer": lawyer
    })))
}

#[axum::debug_handler]
pub async fn upsert_lawyer(
    State(state): State<LawyerState>,
    Extension(session): Extension<SessionContext>,
    Json(request): Json<UpsertLawyerRequest>,
) -> Result<Json<Value>, AppError> {
    let result = state.service().upsert_lawyer(&session, request).await?;

    let message = if result.created {
        "Lawyer created successfully"
    } else {
        "Lawyer updated successfully"
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
        "lawyer": result.lawyer,
        "credentials": result.credentials
    })))
}

#[axum::debug_handler]
pub async fn delete_lawyer(
    State(state): State<LawyerState>,
    Extension(session): Extension<SessionContext>,
    Path(lawyer_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let deletion = state.service().delete_lawyer(&session, &lawyer_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Lawyer {} deleted successfully", deletion.name),
        "deletion": deletion
    })))
}
