use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::store::{DocumentStore, Filter, FilterOp, OrderBy, StoreError};

#[derive(Error, Debug)]
pub enum SupabaseError {
    #[error("API error ({status}): {body}")]
    Status { status: StatusCode, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

impl From<SupabaseError> for StoreError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Status { status: StatusCode::CONFLICT, body } => StoreError::Conflict(body),
            SupabaseError::Status { status: StatusCode::NOT_FOUND, body } => StoreError::NotFound(body),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.store_timeout_seconds))
            .build()
            .unwrap_or_else(|e| {
                error!("Failed to build HTTP client with timeout, using defaults: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, SupabaseError> {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.anon_key))?,
        );

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, SupabaseError>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, SupabaseError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);
            return Err(SupabaseError::Status { status, body: error_text });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }
}

fn representation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => urlencoding::encode(s).into_owned(),
        other => urlencoding::encode(&other.to_string()).into_owned(),
    }
}

/// PostgREST query-string fragment for one filter.
pub fn filter_to_query(filter: &Filter) -> String {
    match (filter.op, &filter.value) {
        (FilterOp::Eq, Value::Null) => format!("{}=is.null", filter.field),
        (FilterOp::Neq, Value::Null) => format!("{}=not.is.null", filter.field),
        (FilterOp::Eq, value) => format!("{}=eq.{}", filter.field, encode_value(value)),
        (FilterOp::Neq, value) => format!("{}=neq.{}", filter.field, encode_value(value)),
    }
}

fn build_path(collection: &str, filters: &[Filter], order: Option<&OrderBy>) -> String {
    let mut query_parts: Vec<String> = filters.iter().map(filter_to_query).collect();

    if let Some(order) = order {
        let direction = if order.descending { "desc" } else { "asc" };
        query_parts.push(format!("order={}.{}", order.field, direction));
    }

    if query_parts.is_empty() {
        format!("/rest/v1/{}", collection)
    } else {
        format!("/rest/v1/{}?{}", collection, query_parts.join("&"))
    }
}

/// Document store backed by PostgREST tables named after the collections, with
/// columns named after the JSON fields.
///
/// Unique inserts rely on a database constraint for the conflict key (for
/// appointments: a partial unique index on `(lawyerId, dateTime)` where
/// `status <> 'cancelled'`); PostgREST reports violations as 409.
pub struct SupabaseDocumentStore {
    supabase: SupabaseClient,
}

impl SupabaseDocumentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl DocumentStore for SupabaseDocumentStore {
    async fn insert(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError> {
        let mut document = document;
        if let Value::Object(map) = &mut document {
            map.insert("id".to_string(), Value::String(id.to_string()));
        }

        let _: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            &build_path(collection, &[], None),
            Some(document),
            Some(representation_headers()),
        ).await?;

        Ok(())
    }

    async fn insert_unique(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        conflicts: &[Filter],
    ) -> Result<(), StoreError> {
        debug!("Unique insert into {} guarded by {} filters", collection, conflicts.len());
        self.insert(collection, id, document).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let path = build_path(collection, &[Filter::eq("id", id)], None);
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(result.into_iter().next())
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&OrderBy>,
    ) -> Result<Vec<Value>, StoreError> {
        let path = build_path(collection, filters, order);
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(result)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
        guard: &[Filter],
    ) -> Result<Value, StoreError> {
        let mut filters = vec![Filter::eq("id", id)];
        filters.extend_from_slice(guard);

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &build_path(collection, &filters, None),
            Some(patch),
            Some(representation_headers()),
        ).await?;

        match result.into_iter().next() {
            Some(updated) => Ok(updated),
            None => match self.get(collection, id).await? {
                Some(_) => Err(StoreError::Conflict(format!(
                    "{}/{} was modified concurrently",
                    collection, id
                ))),
                None => Err(StoreError::NotFound(format!("{}/{}", collection, id))),
            },
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &build_path(collection, &[Filter::eq("id", id)], None),
            None,
            Some(representation_headers()),
        ).await?;

        Ok(!result.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_to_query_encodes_values() {
        let filter = Filter::eq("dateTime", "2025-06-02T12:00:00Z");
        assert_eq!(filter_to_query(&filter), "dateTime=eq.2025-06-02T12%3A00%3A00Z");

        let filter = Filter::neq("status", "cancelled");
        assert_eq!(filter_to_query(&filter), "status=neq.cancelled");

        let filter = Filter::eq("confirmedAt", Value::Null);
        assert_eq!(filter_to_query(&filter), "confirmedAt=is.null");

        let filter = Filter::eq("availableFromWeekDay", json!(1));
        assert_eq!(filter_to_query(&filter), "availableFromWeekDay=eq.1");
    }

    #[test]
    fn test_build_path_with_order() {
        let path = build_path(
            "appointments",
            &[Filter::eq("lawyerId", "user_1")],
            Some(&OrderBy::desc("requestedAt")),
        );
        assert_eq!(path, "/rest/v1/appointments?lawyerId=eq.user_1&order=requestedAt.desc");
    }
}
