//! In-memory backing
//!
//! Keeps jobs in insertion order. Used when no database is configured and in tests.

use async_trait::async_trait;
use indexmap::IndexMap;
use renderq_core::domain::job::Job;
use tokio::sync::Mutex;

use super::{BackingError, JobBacking};

#[derive(Debug, Default)]
pub struct MemoryBacking {
    jobs: Mutex<IndexMap<String, Job>>,
}

impl MemoryBacking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the backing, as if a previous process had written these jobs
    pub fn with_jobs(jobs: impl IntoIterator<Item = Job>) -> Self {
        let jobs = jobs.into_iter().map(|job| (job.uid().to_string(), job)).collect();
        Self {
            jobs: Mutex::new(jobs),
        }
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }
}

#[async_trait]
impl JobBacking for MemoryBacking {
    async fn list(&self) -> Result<Vec<Job>, BackingError> {
        Ok(self.jobs.lock().await.values().cloned().collect())
    }

    async fn get(&self, uid: &str) -> Result<Option<Job>, BackingError> {
        Ok(self.jobs.lock().await.get(uid).cloned())
    }

    async fn put(&self, job: &Job) -> Result<(), BackingError> {
        self.jobs.lock().await.insert(job.uid().to_string(), job.clone());
        Ok(())
    }

    async fn delete(&self, uid: &str) -> Result<bool, BackingError> {
        Ok(self.jobs.lock().await.shift_remove(uid).is_some())
    }

    async fn delete_many(&self, uids: &[String]) -> Result<usize, BackingError> {
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|uid, _| !uids.contains(uid));
        Ok(before - jobs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(uid: &str) -> Job {
        Job::new(uid.to_string(), chrono::Utc::now())
    }

    #[tokio::test]
    async fn test_put_keeps_insertion_position() {
        let backing = MemoryBacking::new();
        backing.put(&job("a")).await.unwrap();
        backing.put(&job("b")).await.unwrap();

        let updated = job("a")
            .merged(serde_json::json!({ "renderProgress": 50 }), chrono::Utc::now())
            .unwrap();
        backing.put(&updated).await.unwrap();

        let uids: Vec<String> = backing
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|j| j.uid().to_string())
            .collect();
        assert_eq!(uids, vec!["a", "b"]);
        assert_eq!(backing.get("a").await.unwrap().unwrap().render_progress(), Some(50.0));
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let backing = MemoryBacking::with_jobs([job("a")]);
        assert!(backing.delete("a").await.unwrap());
        assert!(!backing.delete("a").await.unwrap());
        assert!(backing.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_many_counts_existing_keys() {
        let backing = MemoryBacking::with_jobs([job("a"), job("b"), job("c")]);
        let removed = backing
            .delete_many(&["a".to_string(), "c".to_string(), "zz".to_string()])
            .await
            .unwrap();

        assert_eq!(removed, 2);
        assert_eq!(backing.len().await, 1);
    }
}
