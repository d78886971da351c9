//! Job Store
//!
//! One store per tenant. The in-memory index is the authoritative working
//! copy; the backing is a write-through mirror read only at hydration.
//!
//! Every operation holds the index lock for its whole read, persist and
//! commit sequence, so operations on a tenant never interleave. That is what
//! makes pickup's select-then-claim atomic: two pickups can never see the
//! same queued job.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use renderq_core::domain::job::{Job, ModelError};
use renderq_core::domain::status::JobStatus;
use renderq_core::domain::tags::TagFilter;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::repository::{BackingError, JobBacking};

/// Maximum number of uids removed by one backing call during a sweep
pub const SWEEP_BATCH_SIZE: usize = 128;

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ModelError),

    #[error("job {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Backing(#[from] BackingError),
}

/// Result of one retention sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub batches: usize,
}

pub struct JobStore {
    tenant: String,
    jobs: Mutex<IndexMap<String, Job>>,
    backing: Arc<dyn JobBacking>,
}

impl JobStore {
    /// Load every persisted job into a fresh index
    pub async fn hydrate(
        tenant: impl Into<String>,
        backing: Arc<dyn JobBacking>,
    ) -> Result<Self, BackingError> {
        let tenant = tenant.into();
        let jobs: IndexMap<String, Job> = backing
            .list()
            .await?
            .into_iter()
            .map(|job| (job.uid().to_string(), job))
            .collect();

        tracing::info!("Hydrated tenant {} with {} job(s)", tenant, jobs.len());

        Ok(Self {
            tenant,
            jobs: Mutex::new(jobs),
            backing,
        })
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }

    /// Create a queued job from a request body
    pub async fn create(&self, body: Value, origin: Option<String>) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.lock().await;

        let mut uid = new_uid();
        while jobs.contains_key(&uid) {
            uid = new_uid();
        }

        let job = Job::from_request(body, uid, origin, Utc::now())?;
        self.backing.put(&job).await?;
        jobs.insert(job.uid().to_string(), job.clone());

        tracing::info!("Tenant {}: created job {}", self.tenant, job.uid());
        Ok(job)
    }

    pub async fn list(&self) -> Vec<Job> {
        self.jobs.lock().await.values().cloned().collect()
    }

    pub async fn get(&self, uid: &str) -> Result<Job, StoreError> {
        self.jobs
            .lock()
            .await
            .get(uid)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))
    }

    pub async fn contains(&self, uid: &str) -> bool {
        self.jobs.lock().await.contains_key(uid)
    }

    pub async fn status_list(&self) -> Vec<JobStatus> {
        self.jobs.lock().await.values().map(Job::status).collect()
    }

    pub async fn status(&self, uid: &str) -> Result<JobStatus, StoreError> {
        self.jobs
            .lock()
            .await
            .get(uid)
            .map(Job::status)
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))
    }

    /// Claim the oldest queued job
    ///
    /// With a filter, only queued jobs carrying every requested tag are
    /// eligible. Returns `None` when nothing is eligible.
    pub async fn pickup(
        &self,
        origin: Option<String>,
        filter: Option<&TagFilter>,
    ) -> Result<Option<Job>, StoreError> {
        let mut jobs = self.jobs.lock().await;

        let Some(queued) = jobs.values().find(|job| {
            job.is_queued() && filter.is_none_or(|filter| filter.matches(job))
        }) else {
            tracing::debug!("Tenant {}: no queued job to pick up", self.tenant);
            return Ok(None);
        };

        let job = queued.claimed(origin, Utc::now());

        self.backing.put(&job).await?;
        jobs.insert(job.uid().to_string(), job.clone());

        tracing::info!(
            "Tenant {}: job {} picked up by {}",
            self.tenant,
            job.uid(),
            job.executor().unwrap_or("unknown")
        );
        Ok(Some(job))
    }

    /// Shallow-merge a patch over a stored job
    ///
    /// No transition rules are enforced here: anyone admitted by the auth
    /// gate may set any field, `state` included.
    pub async fn update(&self, uid: &str, patch: Value) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.lock().await;

        let current = jobs
            .get(uid)
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))?;
        let job = current.merged(patch, Utc::now())?;

        self.backing.put(&job).await?;
        jobs.insert(job.uid().to_string(), job.clone());

        tracing::info!(
            "Tenant {}: updated job {} ({})",
            self.tenant,
            job.uid(),
            job.state_str().unwrap_or("no state")
        );
        Ok(job)
    }

    /// Remove a job, reporting whether it existed
    pub async fn delete(&self, uid: &str) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.lock().await;

        let removed = self.backing.delete(uid).await?;
        if removed {
            jobs.shift_remove(uid);
        }

        tracing::info!("Tenant {}: delete job {} (removed: {})", self.tenant, uid, removed);
        Ok(removed)
    }

    /// Delete every terminal job, `SWEEP_BATCH_SIZE` uids per backing call
    ///
    /// A failed batch aborts the sweep. Batches flushed before it stay
    /// deleted and are dropped from the index; the failed batch and
    /// everything after it are left for the next sweep.
    pub async fn sweep(&self) -> Result<SweepReport, StoreError> {
        let mut jobs = self.jobs.lock().await;

        let terminal: Vec<String> = jobs
            .values()
            .filter(|job| job.is_terminal())
            .map(|job| job.uid().to_string())
            .collect();

        let mut report = SweepReport::default();
        let mut flushed: HashSet<&str> = HashSet::new();
        let mut failure = None;

        for batch in terminal.chunks(SWEEP_BATCH_SIZE) {
            match self.backing.delete_many(batch).await {
                Ok(_) => {
                    flushed.extend(batch.iter().map(String::as_str));
                    report.batches += 1;
                    report.removed += batch.len();
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        if !flushed.is_empty() {
            jobs.retain(|uid, _| !flushed.contains(uid.as_str()));
        }

        match failure {
            Some(err) => {
                tracing::error!(
                    "Tenant {}: sweep aborted after {} batch(es): {}",
                    self.tenant,
                    report.batches,
                    err
                );
                Err(err.into())
            }
            None => Ok(report),
        }
    }
}

fn new_uid() -> String {
    Uuid::new_v4().simple().to_string()
}
