//! Job-related API endpoints

use renderq_core::domain::job::Job;
use renderq_core::domain::status::JobStatus;
use renderq_core::dto::job::{DeleteResult, PickupResponse};
use reqwest::Method;
use serde::Serialize;

use crate::QueueClient;
use crate::error::Result;

impl QueueClient {
    // =============================================================================
    // Producers
    // =============================================================================

    /// Queue a new render job
    ///
    /// The body may carry any job field. `uid`, `state`, `creator` and the
    /// store-managed timestamps are set by the server.
    pub async fn create_job<B: Serialize + ?Sized>(&self, body: &B) -> Result<Job> {
        let response = self.request(Method::POST, &["jobs"])?.json(body).send().await?;

        self.handle_response(response).await
    }

    /// List every job of the tenant
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        let response = self.request(Method::GET, &["jobs"])?.send().await?;

        self.handle_response(response).await
    }

    /// Status projection of every job of the tenant
    pub async fn list_statuses(&self) -> Result<Vec<JobStatus>> {
        let response = self.request(Method::GET, &["jobs", "status"])?.send().await?;

        self.handle_response(response).await
    }

    /// Get a job by uid
    pub async fn get_job(&self, uid: &str) -> Result<Job> {
        let response = self.request(Method::GET, &["jobs", uid])?.send().await?;

        self.handle_response(response).await
    }

    /// Status projection of one job
    pub async fn job_status(&self, uid: &str) -> Result<JobStatus> {
        let response = self
            .request(Method::GET, &["jobs", uid, "status"])?
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete a job
    ///
    /// # Returns
    /// Whether the job existed
    pub async fn delete_job(&self, uid: &str) -> Result<bool> {
        let response = self.request(Method::DELETE, &["jobs", uid])?.send().await?;

        let result: DeleteResult = self.handle_response(response).await?;
        Ok(result.removed)
    }

    // =============================================================================
    // Workers
    // =============================================================================

    /// Claim the oldest queued job
    ///
    /// # Returns
    /// `None` when the queue is empty
    pub async fn pickup(&self) -> Result<Option<Job>> {
        let response = self.request(Method::GET, &["jobs", "pickup"])?.send().await?;

        let pickup: PickupResponse = self.handle_response(response).await?;
        Ok(pickup.into_job())
    }

    /// Claim the oldest queued job carrying every tag in `tags`
    pub async fn pickup_tagged(&self, tags: &[&str]) -> Result<Option<Job>> {
        let tags = tags.join(",");
        let response = self
            .request(Method::GET, &["jobs", "pickup", tags.as_str()])?
            .send()
            .await?;

        let pickup: PickupResponse = self.handle_response(response).await?;
        Ok(pickup.into_job())
    }

    /// Shallow-merge `patch` over the stored job
    ///
    /// Workers use this to report state, progress and errors.
    pub async fn update_job<P: Serialize + ?Sized>(&self, uid: &str, patch: &P) -> Result<Job> {
        let response = self
            .request(Method::PUT, &["jobs", uid])?
            .json(patch)
            .send()
            .await?;

        self.handle_response(response).await
    }
}
