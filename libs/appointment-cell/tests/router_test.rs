use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::{appointment_routes, dashboard_routes, AppointmentState};
use lawyer_cell::{LawyerService, UpsertLawyerRequest};
use notification_cell::RecordingSink;
use shared_utils::test_utils::{TestBackend, TestUser};

struct Harness {
    backend: TestBackend,
    sink: Arc<RecordingSink>,
    lawyer_id: String,
}

impl Harness {
    async fn new() -> Self {
        let backend = TestBackend::new();
        let lawyer = LawyerService::new(&backend.config, backend.dyn_store(), backend.sessions.clone())
            .upsert_lawyer(
                &TestUser::admin("admin@fgjn.adv.br").to_session(),
                UpsertLawyerRequest {
                    id: None,
                    name: "Carlos Nunes".to_string(),
                    specialty: "Direito de Família".to_string(),
                    appointment_price_cents: 20000,
                    available_from_week_day: 1,
                    available_to_week_day: 5,
                    available_from_time: "09:00".to_string(),
                    available_to_time: "12:00".to_string(),
                    bio: None,
                },
            )
            .await
            .unwrap()
            .lawyer;

        Self {
            backend,
            sink: Arc::new(RecordingSink::new()),
            lawyer_id: lawyer.id,
        }
    }

    fn state(&self) -> AppointmentState {
        AppointmentState {
            config: self.backend.config.clone(),
            store: self.backend.dyn_store(),
            sessions: self.backend.sessions.clone(),
            notifier: self.sink.clone(),
        }
    }

    fn appointments(&self) -> Router {
        appointment_routes(self.state())
    }

    fn dashboard(&self) -> Router {
        dashboard_routes(self.state())
    }
}

fn authorized(method: Method, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_available_times_requires_session() {
    let harness = Harness::new().await;

    let response = harness
        .appointments()
        .oneshot(
            Request::builder()
                .uri(format!("/available-times?lawyerId={}&date=2025-03-10", harness.lawyer_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_available_times_window() {
    let harness = Harness::new().await;
    let token = harness.backend.login(&TestUser::client("maria@example.com")).await;

    let response = harness
        .appointments()
        .oneshot(authorized(
            Method::GET,
            &format!("/available-times?lawyerId={}&date=2025-03-10", harness.lawyer_id),
            &token,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let values: Vec<&str> = json["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["value"].as_str().unwrap())
        .collect();
    assert_eq!(values, vec!["09:30:00", "10:00:00", "10:30:00", "11:00:00", "11:30:00"]);
    assert_eq!(json["slots"][0]["label"], "09:30");
}

#[tokio::test]
async fn test_booking_and_admin_flow() {
    let harness = Harness::new().await;
    let client = TestUser::client("maria@example.com");
    let client_token = harness.backend.login(&client).await;
    let admin_token = harness.backend.login(&TestUser::admin("carlos@fgjn.adv.br")).await;

    let response = harness
        .appointments()
        .oneshot(authorized(
            Method::POST,
            "/",
            &client_token,
            Some(json!({
                "patientId": client.id,
                "patientName": client.name,
                "patientEmail": client.email,
                "lawyerId": harness.lawyer_id,
                "lawyerName": "Carlos Nunes",
                "specialty": "Direito de Família",
                "requestedDate": "2025-03-10",
                "requestedTime": "10:00",
                "description": "Divórcio consensual com partilha de bens"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let appointment_id = body_json(response).await["appointmentId"].as_str().unwrap().to_string();

    // clients cannot change status
    let response = harness
        .appointments()
        .oneshot(authorized(
            Method::PATCH,
            &format!("/{}/status", appointment_id),
            &client_token,
            Some(json!({ "status": "confirmed" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = harness
        .appointments()
        .oneshot(authorized(
            Method::PATCH,
            &format!("/{}/status", appointment_id),
            &admin_token,
            Some(json!({ "status": "confirmed", "notes": "Trazer certidão de casamento" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Appointment confirmed successfully");
    assert_eq!(json["appointment"]["notes"], "Trazer certidão de casamento");
    assert_eq!(harness.sink.count_of("appointment_confirmed"), 1);

    let response = harness
        .appointments()
        .oneshot(authorized(
            Method::PATCH,
            &format!("/{}/status", appointment_id),
            &admin_token,
            Some(json!({ "status": "pending" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = harness
        .appointments()
        .oneshot(authorized(Method::GET, "/mine", &client_token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["appointments"]["counts"]["confirmed"], 1);

    let response = harness
        .dashboard()
        .oneshot(authorized(Method::GET, "/", &admin_token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["dashboard"]["totalRevenueCents"], 20000);
    assert_eq!(json["dashboard"]["topLawyers"][0]["name"], "Carlos Nunes");
}

#[tokio::test]
async fn test_double_booking_is_conflict() {
    let harness = Harness::new().await;
    let client = TestUser::client("maria@example.com");
    let token = harness.backend.login(&client).await;

    let body = json!({
        "patientId": client.id,
        "patientName": client.name,
        "patientEmail": client.email,
        "lawyerId": harness.lawyer_id,
        "lawyerName": "Carlos Nunes",
        "specialty": "Direito de Família",
        "requestedDate": "2025-03-11",
        "requestedTime": "11:00:00",
        "description": "Pensão alimentícia dos filhos"
    });

    let first = harness
        .appointments()
        .oneshot(authorized(Method::POST, "/", &token, Some(body.clone())))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = harness
        .appointments()
        .oneshot(authorized(Method::POST, "/", &token, Some(body)))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["success"], false);
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let harness = Harness::new().await;
    let token = harness.backend.login(&TestUser::admin("carlos@fgjn.adv.br")).await;

    let response = harness
        .appointments()
        .oneshot(authorized(Method::DELETE, "/appointment_missing", &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_is_admin_only() {
    let harness = Harness::new().await;
    let token = harness.backend.login(&TestUser::client("maria@example.com")).await;

    for uri in ["/", "/clients"] {
        let response = harness
            .dashboard()
            .oneshot(authorized(Method::GET, uri, &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
