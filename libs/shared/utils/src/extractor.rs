use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
    body::Body,
};

use shared_models::auth::SessionContext;
use shared_models::error::AppError;

use crate::session::SessionManager;

/// Resolves the bearer session token into a `SessionContext` request extension.
pub async fn auth_middleware(
    State(sessions): State<Arc<SessionManager>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?;

    let session = sessions.validate(&token).await?;

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

pub fn bearer_token<B>(request: &Request<B>) -> Result<String, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthenticated("Invalid authorization header format".to_string()))?;

    auth_value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthenticated("Invalid authorization header format".to_string()))
}

pub fn extract_session<B>(request: &Request<B>) -> Result<SessionContext, AppError> {
    request
        .extensions()
        .get::<SessionContext>()
        .cloned()
        .ok_or_else(|| AppError::Unauthenticated("Session not found in request extensions".to_string()))
}
