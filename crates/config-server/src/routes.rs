use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use facestream_config::domain::config_error::ConfigStoreError;
use facestream_config::domain::config_store::ConfigStore;
use facestream_config::domain::stored_stream_config::StoredStreamConfig;
use facestream_config::infrastructure::http_config_store::API_PATH;

use crate::error::{ApiError, ApiResult};

pub type SharedStore = Arc<dyn ConfigStore>;

#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    stream_key: Option<String>,
}

impl KeyQuery {
    fn required_key(&self) -> ApiResult<&str> {
        match self.stream_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ApiError::bad_request("stream_key parameter required")),
        }
    }
}

/// Builds the service router over `store`.
pub fn create_router(store: SharedStore) -> Router {
    Router::new()
        .route(
            API_PATH,
            get(get_config).post(save_config).delete(delete_config),
        )
        .fallback(not_found)
        .layer(middleware::from_fn(log_requests))
        .with_state(store)
}

/// Runs a store call on the blocking pool; the stores do synchronous I/O.
async fn with_store<T, F>(store: SharedStore, call: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn ConfigStore) -> ApiResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(store.as_ref()))
        .await
        .map_err(|e| ApiError::internal(format!("Store task failed: {e}")))?
}

async fn get_config(
    State(store): State<SharedStore>,
    Query(query): Query<KeyQuery>,
) -> ApiResult<Json<StoredStreamConfig>> {
    let key = query.required_key()?.to_string();
    let record = with_store(store, move |store| match store.load(&key) {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err(ApiError::not_found("Configuration not found")),
        Err(e @ ConfigStoreError::InvalidKey(_)) => Err(ApiError::bad_request(e.to_string())),
        Err(e) => Err(ApiError::internal(format!("Failed to read config: {e}"))),
    })
    .await?;
    Ok(Json(record))
}

async fn save_config(State(store): State<SharedStore>, body: Bytes) -> ApiResult<Json<Value>> {
    if body.is_empty() {
        return Err(ApiError::bad_request("Request body required"));
    }
    let data: Value =
        serde_json::from_slice(&body).map_err(|_| ApiError::bad_request("Invalid JSON"))?;

    let has_key = data
        .get("stream_key")
        .and_then(Value::as_str)
        .is_some_and(|key| !key.is_empty());
    if !has_key {
        return Err(ApiError::bad_request("stream_key field required"));
    }

    let record: StoredStreamConfig =
        serde_json::from_value(data).map_err(|_| ApiError::bad_request("Invalid JSON"))?;
    record
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let record = with_store(store, move |store| match store.save(&record) {
        Ok(()) => Ok(record),
        Err(e @ ConfigStoreError::InvalidKey(_)) => Err(ApiError::bad_request(e.to_string())),
        Err(e) => Err(ApiError::internal(format!("Failed to save config: {e}"))),
    })
    .await?;

    log::info!("Saved configuration for {}", record.stream_key);
    Ok(Json(json!({
        "message": "Configuration saved",
        "config": record,
    })))
}

async fn delete_config(
    State(store): State<SharedStore>,
    Query(query): Query<KeyQuery>,
) -> ApiResult<Json<Value>> {
    let key = query.required_key()?.to_string();
    let deleted_key = key.clone();
    with_store(store, move |store| match store.delete(&key) {
        Ok(true) => Ok(()),
        Ok(false) => Err(ApiError::not_found("Configuration not found")),
        Err(e @ ConfigStoreError::InvalidKey(_)) => Err(ApiError::bad_request(e.to_string())),
        Err(e) => Err(ApiError::internal(format!("Failed to delete config: {e}"))),
    })
    .await?;

    log::info!("Deleted configuration for {deleted_key}");
    Ok(Json(json!({ "message": "Configuration deleted" })))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Endpoint not found")
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    log::info!("{method} {path} {}", response.status().as_u16());
    response
}
