use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::{
    DocumentStore, Filter, InMemoryDocumentStore, OrderBy, StoreError, SupabaseDocumentStore,
};

fn appointment_conflicts(lawyer_id: &str, date_time: &str) -> Vec<Filter> {
    vec![
        Filter::eq("lawyerId", lawyer_id),
        Filter::eq("dateTime", date_time),
        Filter::neq("status", "cancelled"),
    ]
}

#[tokio::test]
async fn test_memory_insert_and_get_sets_id() {
    let store = InMemoryDocumentStore::new();
    store.insert("lawyers", "user_1", json!({ "name": "Ana" })).await.unwrap();

    let doc = store.get("lawyers", "user_1").await.unwrap().unwrap();
    assert_eq!(doc["id"], "user_1");
    assert_eq!(doc["name"], "Ana");
    assert!(store.get("lawyers", "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_memory_insert_duplicate_id_conflicts() {
    let store = InMemoryDocumentStore::new();
    store.insert("users", "u1", json!({})).await.unwrap();

    let result = store.insert("users", "u1", json!({})).await;
    assert_matches!(result, Err(StoreError::Conflict(_)));
}

#[tokio::test]
async fn test_memory_insert_unique_ignores_cancelled() {
    let store = InMemoryDocumentStore::new();
    let slot = "2025-06-02T12:00:00Z";

    store.insert("appointments", "a1", json!({
        "lawyerId": "l1", "dateTime": slot, "status": "cancelled"
    })).await.unwrap();

    store.insert_unique("appointments", "a2", json!({
        "lawyerId": "l1", "dateTime": slot, "status": "pending"
    }), &appointment_conflicts("l1", slot)).await.unwrap();

    let again = store.insert_unique("appointments", "a3", json!({
        "lawyerId": "l1", "dateTime": slot, "status": "pending"
    }), &appointment_conflicts("l1", slot)).await;

    assert_matches!(again, Err(StoreError::Conflict(_)));
    assert_eq!(store.count("appointments").await, 2);
}

#[tokio::test]
async fn test_memory_concurrent_unique_inserts_admit_one() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let slot = "2025-06-02T12:00:00Z";

    let attempts = (0..8).map(|i| {
        let store = store.clone();
        tokio::spawn(async move {
            store.insert_unique(
                "appointments",
                &format!("a{}", i),
                json!({ "lawyerId": "l1", "dateTime": slot, "status": "pending" }),
                &appointment_conflicts("l1", slot),
            ).await
        })
    });

    let results = futures::future::join_all(attempts).await;
    let successes = results.into_iter().filter(|r| matches!(r, Ok(Ok(())))).count();

    assert_eq!(successes, 1);
    assert_eq!(store.count("appointments").await, 1);
}

#[tokio::test]
async fn test_memory_query_filters_and_orders() {
    let store = InMemoryDocumentStore::new();
    store.insert("appointments", "a1", json!({ "patientId": "p1", "requestedAt": "2025-01-01T00:00:00Z" })).await.unwrap();
    store.insert("appointments", "a2", json!({ "patientId": "p1", "requestedAt": "2025-03-01T00:00:00Z" })).await.unwrap();
    store.insert("appointments", "a3", json!({ "patientId": "p2", "requestedAt": "2025-02-01T00:00:00Z" })).await.unwrap();

    let docs = store.query(
        "appointments",
        &[Filter::eq("patientId", "p1")],
        Some(&OrderBy::desc("requestedAt")),
    ).await.unwrap();

    let ids: Vec<_> = docs.iter().map(|d| d["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["a2", "a1"]);
}

#[tokio::test]
async fn test_memory_guarded_update() {
    let store = InMemoryDocumentStore::new();
    store.insert("appointments", "a1", json!({ "status": "pending", "notes": null })).await.unwrap();

    let updated = store.update(
        "appointments",
        "a1",
        json!({ "status": "confirmed" }),
        &[Filter::eq("status", "pending")],
    ).await.unwrap();
    assert_eq!(updated["status"], "confirmed");

    let stale = store.update(
        "appointments",
        "a1",
        json!({ "status": "cancelled" }),
        &[Filter::eq("status", "pending")],
    ).await;
    assert_matches!(stale, Err(StoreError::Conflict(_)));

    let missing = store.update("appointments", "nope", json!({}), &[]).await;
    assert_matches!(missing, Err(StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_memory_delete_reports_existence() {
    let store = InMemoryDocumentStore::new();
    store.insert("sessions", "t1", json!({})).await.unwrap();

    assert!(store.delete("sessions", "t1").await.unwrap());
    assert!(!store.delete("sessions", "t1").await.unwrap());
}

fn remote_config(uri: String) -> AppConfig {
    AppConfig {
        supabase_url: uri,
        supabase_anon_key: "test-anon-key".to_string(),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn test_supabase_conflict_maps_to_store_conflict() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&mock_server)
        .await;

    let store = SupabaseDocumentStore::new(&remote_config(mock_server.uri()));
    let result = store.insert_unique(
        "appointments",
        "a1",
        json!({ "lawyerId": "l1" }),
        &appointment_conflicts("l1", "2025-06-02T12:00:00Z"),
    ).await;

    assert_matches!(result, Err(StoreError::Conflict(_)));
}

#[tokio::test]
async fn test_supabase_query_uses_filters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("lawyerId", "eq.l1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "a1", "lawyerId": "l1" }
        ])))
        .mount(&mock_server)
        .await;

    let store = SupabaseDocumentStore::new(&remote_config(mock_server.uri()));
    let docs = store.query("appointments", &[Filter::eq("lawyerId", "l1")], None).await.unwrap();

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["id"], "a1");
}

#[tokio::test]
async fn test_supabase_guarded_update_conflict_when_row_exists() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "a1", "status": "confirmed" }
        ])))
        .mount(&mock_server)
        .await;

    let store = SupabaseDocumentStore::new(&remote_config(mock_server.uri()));
    let result = store.update(
        "appointments",
        "a1",
        json!({ "status": "cancelled" }),
        &[Filter::eq("status", "pending")],
    ).await;

    assert_matches!(result, Err(StoreError::Conflict(_)));
}

#[tokio::test]
async fn test_supabase_server_error_is_backend_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/lawyers"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let store = SupabaseDocumentStore::new(&remote_config(mock_server.uri()));
    let result = store.get("lawyers", "l1").await;

    assert_matches!(result, Err(StoreError::Backend(_)));
}
