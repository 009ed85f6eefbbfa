use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use lawyer_cell::{lawyer_routes, LawyerState};
use shared_utils::test_utils::{forged_token, TestBackend, TestUser};

fn app(backend: &TestBackend) -> axum::Router {
    lawyer_routes(LawyerState {
        config: backend.config.clone(),
        store: backend.dyn_store(),
        sessions: backend.sessions.clone(),
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn lawyer_payload() -> Value {
    json!({
        "name": "Carla Mendes",
        "specialty": "Direito de Família",
        "appointmentPriceCents": 15000,
        "availableFromWeekDay": 1,
        "availableToWeekDay": 5,
        "availableFromTime": "08:00",
        "availableToTime": "17:00"
    })
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let backend = TestBackend::new();

    let response = app(&backend)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_forged_token_is_unauthorized() {
    let backend = TestBackend::new();

    let response = app(&backend)
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::AUTHORIZATION, format!("Bearer {}", forged_token()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_creates_then_client_lists() {
    let backend = TestBackend::new();
    let admin_token = backend.login(&TestUser::admin("admin@fgjn.adv.br")).await;
    let client_token = backend.login(&TestUser::client("cliente@example.com")).await;

    let response = app(&backend)
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/")
                .header(header::AUTHORIZATION, format!("Bearer {}", admin_token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(lawyer_payload().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["success"], true);
    assert_eq!(created["credentials"]["email"], "carla.mendes@fgjn.adv.br");
    let lawyer_id = created["lawyer"]["id"].as_str().unwrap().to_string();

    let response = app(&backend)
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::AUTHORIZATION, format!("Bearer {}", client_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["lawyers"][0]["id"], lawyer_id.as_str());
    assert_eq!(listed["lawyers"][0]["appointmentPriceLabel"], "R$ 150,00");
}

#[tokio::test]
async fn test_client_cannot_delete_lawyer() {
    let backend = TestBackend::new();
    let client_token = backend.login(&TestUser::client("cliente@example.com")).await;

    let response = app(&backend)
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/user_whatever")
                .header(header::AUTHORIZATION, format!("Bearer {}", client_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_lawyer_is_not_found() {
    let backend = TestBackend::new();
    let token = backend.login(&TestUser::client("cliente@example.com")).await;

    let response = app(&backend)
        .oneshot(
            Request::builder()
                .uri("/user_missing")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
