//! API Module
//!
//! HTTP API layer for the queue.
//! Job routes live under `/api/v1` and are guarded by the tenant gate.

pub mod error;
pub mod health;
pub mod job;
pub mod middleware;

use std::sync::Arc;

use axum::{Router, middleware::from_fn_with_state, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::tenant::TenantDirectory;

/// Create the main API router with all endpoints
pub fn create_router(directory: Arc<TenantDirectory>) -> Router {
    let jobs = Router::new()
        .route("/jobs", get(job::list_jobs).post(job::create_job))
        .route("/jobs/status", get(job::list_statuses))
        .route("/jobs/pickup", get(job::pickup_job))
        .route("/jobs/pickup/{tags}", get(job::pickup_tagged_job))
        .route("/jobs/{uid}/status", get(job::get_job_status))
        .route(
            "/jobs/{uid}",
            get(job::get_job).put(job::update_job).delete(job::delete_job),
        )
        .route_layer(from_fn_with_state(directory.clone(), middleware::tenant_gate));

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .nest("/api/v1", jobs)
        // Add state and middleware
        .with_state(directory)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
