//! Job API Handlers
//!
//! HTTP endpoints for the job lifecycle. Each handler runs after the tenant
//! gate and works on the resolved tenant's store.

use std::sync::Arc;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::Path,
};
use renderq_core::domain::job::Job;
use renderq_core::domain::status::JobStatus;
use renderq_core::domain::tags::TagFilter;
use renderq_core::dto::job::{DeleteResult, PickupResponse};
use serde_json::Value;

use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::CallerOrigin;
use crate::tenant::Tenant;

fn parse_body(body: &Bytes) -> ApiResult<Value> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

/// POST /jobs
/// Create a queued job
pub async fn create_job(
    Extension(tenant): Extension<Arc<Tenant>>,
    CallerOrigin(origin): CallerOrigin,
    body: Bytes,
) -> ApiResult<Json<Job>> {
    let body = parse_body(&body)?;
    let store = tenant.store().await?;

    let job = store.create(body, origin).await?;
    Ok(Json(job))
}

/// GET /jobs
/// List all jobs of the tenant
pub async fn list_jobs(Extension(tenant): Extension<Arc<Tenant>>) -> ApiResult<Json<Vec<Job>>> {
    tracing::debug!("Listing jobs for tenant {}", tenant.name());

    let store = tenant.store().await?;
    Ok(Json(store.list().await))
}

/// GET /jobs/status
/// Status projection of all jobs
pub async fn list_statuses(
    Extension(tenant): Extension<Arc<Tenant>>,
) -> ApiResult<Json<Vec<JobStatus>>> {
    tracing::debug!("Listing job statuses for tenant {}", tenant.name());

    let store = tenant.store().await?;
    Ok(Json(store.status_list().await))
}

/// GET /jobs/pickup
/// Claim the oldest queued job, or `{}` when none is queued
pub async fn pickup_job(
    Extension(tenant): Extension<Arc<Tenant>>,
    CallerOrigin(origin): CallerOrigin,
) -> ApiResult<Json<PickupResponse>> {
    let store = tenant.store().await?;

    let job = store.pickup(origin, None).await?;
    Ok(Json(job.into()))
}

/// GET /jobs/pickup/{tags}
/// Claim the oldest queued job carrying every listed tag
pub async fn pickup_tagged_job(
    Extension(tenant): Extension<Arc<Tenant>>,
    CallerOrigin(origin): CallerOrigin,
    Path(tags): Path<String>,
) -> ApiResult<Json<PickupResponse>> {
    let filter = TagFilter::parse(&tags);
    tracing::debug!("Pickup for tenant {} with tags {:?}", tenant.name(), filter.tags());

    let store = tenant.store().await?;
    let filter = (!filter.is_empty()).then_some(filter);

    let job = store.pickup(origin, filter.as_ref()).await?;
    Ok(Json(job.into()))
}

/// GET /jobs/{uid}/status
/// Status projection of one job
pub async fn get_job_status(
    Extension(tenant): Extension<Arc<Tenant>>,
    Path(uid): Path<String>,
) -> ApiResult<Json<JobStatus>> {
    tracing::debug!("Getting status of job {}", uid);

    let store = tenant.store().await?;
    Ok(Json(store.status(&uid).await?))
}

/// GET /jobs/{uid}
/// Full job record
pub async fn get_job(
    Extension(tenant): Extension<Arc<Tenant>>,
    Path(uid): Path<String>,
) -> ApiResult<Json<Job>> {
    tracing::debug!("Getting job {}", uid);

    let store = tenant.store().await?;
    Ok(Json(store.get(&uid).await?))
}

/// PUT /jobs/{uid}
/// Shallow-merge the body over the stored job
pub async fn update_job(
    Extension(tenant): Extension<Arc<Tenant>>,
    Path(uid): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Job>> {
    let store = tenant.store().await?;
    if !store.contains(&uid).await {
        return Err(ApiError::NotFound(format!("Job {} not found", uid)));
    }

    let patch = parse_body(&body)?;
    Ok(Json(store.update(&uid, patch).await?))
}

/// DELETE /jobs/{uid}
/// Remove a job; deleting a missing job reports `removed: false`
pub async fn delete_job(
    Extension(tenant): Extension<Arc<Tenant>>,
    Path(uid): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    let store = tenant.store().await?;

    let removed = store.delete(&uid).await?;
    Ok(Json(DeleteResult { id: uid, removed }))
}
