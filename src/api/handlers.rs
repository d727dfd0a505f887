//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::cache::{
    CacheBackend, CacheCoordinator, CacheStore, CoordinatorConfig, StatsSnapshot,
};
use crate::error::{CacheError, Result};
use crate::models::{ContentRequest, HealthResponse, InvalidateResponse, LookupResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide cache entry point
    pub cache: Arc<CacheCoordinator>,
}

impl AppState {
    /// Creates a new AppState around an existing coordinator.
    pub fn new(cache: Arc<CacheCoordinator>) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration over `backend`.
    pub fn from_config(config: &crate::config::Config, backend: Arc<dyn CacheBackend>) -> Self {
        let store = Arc::new(CacheStore::new(backend));
        let coordinator = CacheCoordinator::new(store, CoordinatorConfig::from(config));
        Self::new(Arc::new(coordinator))
    }
}

/// Handler for POST /lookup
///
/// Returns the live cached payload for a (content, category) pair
/// without counting it as a hit or miss.
pub async fn lookup_handler(
    State(state): State<AppState>,
    Json(req): Json<ContentRequest>,
) -> Result<Json<LookupResponse>> {
    let key = req.key()?;
    match state.cache.store().peek(&key).await {
        Some(payload) => Ok(Json(LookupResponse::new(key, payload))),
        None => Err(CacheError::NotCached(key.to_string())),
    }
}

/// Handler for POST /invalidate
///
/// Drops the cached payload for a (content, category) pair. Succeeds
/// whether or not anything was cached.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<ContentRequest>,
) -> Result<Json<InvalidateResponse>> {
    let key = state.cache.invalidate(&req.content, &req.category).await?;
    Ok(Json(InvalidateResponse::new(key)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.cache.stats().snapshot())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
