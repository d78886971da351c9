//! Health check endpoint

use std::sync::Arc;

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::tenant::TenantDirectory;

/// GET /health
///
/// Answers without touching any tenant store, so it stays cheap while
/// stores are still hydrating.
pub async fn health_check(State(directory): State<Arc<TenantDirectory>>) -> Json<Value> {
    Json(json!({ "status": "ok", "tenants": directory.len() }))
}
