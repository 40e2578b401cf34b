use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;

use super::store::{InMemoryListingStore, SandboxError, SandboxPage, StatusChange};
use crate::workflows::review::SummaryCounts;

/// Admin listing endpoints served from the in-memory store.
pub fn sandbox_router(store: Arc<InMemoryListingStore>) -> Router {
    Router::new()
        .route("/api/admin/properties", get(list_handler))
        .route("/api/admin/properties/summary", get(summary_handler))
        .route("/api/admin/properties/:id/status", patch(status_handler))
        .with_state(store)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListParams {
    status: Option<String>,
    page: Option<u32>,
    size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    status: Option<String>,
}

pub(crate) async fn list_handler(
    State(store): State<Arc<InMemoryListingStore>>,
    Query(params): Query<ListParams>,
) -> Result<Json<SandboxPage>, SandboxError> {
    store
        .page(params.status.as_deref(), params.page, params.size)
        .map(Json)
}

pub(crate) async fn summary_handler(
    State(store): State<Arc<InMemoryListingStore>>,
) -> Json<SummaryCounts> {
    Json(store.summary())
}

pub(crate) async fn status_handler(
    State(store): State<Arc<InMemoryListingStore>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<StatusBody>,
) -> Result<Json<StatusChange>, SandboxError> {
    store.authorize(bearer_token(&headers))?;
    store.set_status(id, body.status.as_deref()).map(Json)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}
