//! API Handlers
//!
//! HTTP request handlers for each cache endpoint. All of them go through the
//! suspending half of the cache service.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tokio::task::JoinHandle;

use crate::cache::CacheService;
use crate::config::Config;
use crate::error::Result;
use crate::models::{ErrorResponse, HealthResponse, KeyResponse, SetQuery};
use crate::store::{MemoryCollection, MemoryDatabase};
use crate::tasks::spawn_cleanup_task;

/// Application state shared across all handlers.
///
/// The service holds no mutable state, so it is shared without a lock.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheService<MemoryCollection>>,
}

impl AppState {
    /// Creates a new AppState around the given service.
    pub fn new(cache: CacheService<MemoryCollection>) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens the configured collection in `database` and, when enabled,
    /// starts the expired entry cleanup task. Must run inside a tokio runtime.
    pub fn from_config(config: &Config, database: &MemoryDatabase) -> (Self, Option<JoinHandle<()>>) {
        let store = Arc::new(database.collection(&config.collection_name));
        let service = CacheService::new(store.clone(), config.cache_options());

        if !config.cleanup_on_read {
            return (Self::new(service), None);
        }

        let (cleanup, handle) =
            spawn_cleanup_task(store, service.clock().clone(), config.cleanup_queue_capacity);
        (Self::new(service.with_cleanup(cleanup)), Some(handle))
    }
}

/// Handler for PUT /entries/:key
///
/// Stores the raw request body under the key, with expiration taken from
/// the query string.
pub async fn set_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<SetQuery>,
    body: Bytes,
) -> Result<Json<KeyResponse>> {
    let options = query.to_options()?;
    state.cache.set_async(&key, &body, &options).await?;
    Ok(Json(KeyResponse::set(key)))
}

/// Handler for GET /entries/:key
///
/// Returns the payload as `application/octet-stream`, or 404 if the key is
/// missing or expired.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response> {
    let response = match state.cache.get_async(&key).await? {
        Some(value) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            value,
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Key not found: {}", key))),
        )
            .into_response(),
    };
    Ok(response)
}

/// Handler for POST /entries/:key/refresh
pub async fn refresh_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<KeyResponse>> {
    state.cache.refresh_async(&key).await?;
    Ok(Json(KeyResponse::refreshed(key)))
}

/// Handler for DELETE /entries/:key
///
/// Succeeds whether or not the key existed.
pub async fn remove_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<KeyResponse>> {
    state.cache.remove_async(&key).await?;
    Ok(Json(KeyResponse::removed(key)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
