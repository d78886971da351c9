//! Job status projection

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::job::Job;
use crate::domain::state::JobState;

/// Read-only view of a job without its render payload
///
/// Never carries `template`, `assets`, `actions` or unknown keys. Values
/// are copied from the job as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobStatus {
    pub uid: String,
    pub state: Value,
    #[serde(rename = "type")]
    pub job_type: Value,
    pub tags: Value,
    pub render_progress: Value,
    pub error: Value,
    pub created_at: Value,
    pub updated_at: Value,
    pub started_at: Value,
    pub finished_at: Value,
    pub error_at: Value,
    pub job_creator: Value,
    pub job_executor: Value,
}

impl JobStatus {
    /// `None` when the state is missing or outside the known vocabulary
    pub fn state(&self) -> Option<JobState> {
        self.state.as_str().and_then(|state| state.parse().ok())
    }
}

impl From<&Job> for JobStatus {
    fn from(job: &Job) -> Self {
        let field = |key: &str| job.get(key).cloned().unwrap_or_default();

        Self {
            uid: job.uid().to_string(),
            state: field("state"),
            job_type: field("type"),
            tags: field("tags"),
            render_progress: field("renderProgress"),
            error: field("error"),
            created_at: field("createdAt"),
            updated_at: field("updatedAt"),
            started_at: field("startedAt"),
            finished_at: field("finishedAt"),
            error_at: field("errorAt"),
            job_creator: field("creator"),
            job_executor: field("executor"),
        }
    }
}
