//! Repository Module
//!
//! Persistent backing for a tenant's jobs.
//! The job store keeps its working copy in memory and mirrors every mutation
//! here before acknowledging it; the backing is only read back at hydration.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use renderq_core::domain::job::Job;
use sqlx::PgPool;

pub use memory::MemoryBacking;
pub use postgres::PgBacking;

/// Backing store error type
#[derive(Debug, thiserror::Error)]
pub enum BackingError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("job record {uid} could not be encoded or decoded: {source}")]
    Codec {
        uid: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("backing store unavailable: {0}")]
    Unavailable(String),
}

/// Durable key-value storage for one tenant, keyed by job uid
///
/// A completed write must be visible to every later read.
#[async_trait]
pub trait JobBacking: Send + Sync {
    /// All persisted jobs, in the order they were first written
    async fn list(&self) -> Result<Vec<Job>, BackingError>;

    async fn get(&self, uid: &str) -> Result<Option<Job>, BackingError>;

    /// Insert or replace a job. Replacing keeps the original position.
    async fn put(&self, job: &Job) -> Result<(), BackingError>;

    /// Returns whether the key existed
    async fn delete(&self, uid: &str) -> Result<bool, BackingError>;

    /// Delete a batch of keys in one call, returning how many existed
    async fn delete_many(&self, uids: &[String]) -> Result<usize, BackingError>;
}

/// Creates the per-tenant backing for the configured storage engine
#[derive(Clone)]
pub enum BackingProvider {
    /// Process-local, lost on restart
    Memory,
    Postgres(PgPool),
}

impl BackingProvider {
    pub fn for_tenant(&self, tenant: &str) -> Arc<dyn JobBacking> {
        match self {
            BackingProvider::Memory => Arc::new(MemoryBacking::new()),
            BackingProvider::Postgres(pool) => Arc::new(PgBacking::new(pool.clone(), tenant)),
        }
    }
}
