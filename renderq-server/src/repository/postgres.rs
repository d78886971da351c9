//! PostgreSQL backing
//!
//! Every tenant shares the `jobs` table, partitioned by the `tenant` column.
//! The job record is stored as JSONB; `seq` preserves insertion order across
//! restarts so FIFO pickup survives a reload.

use async_trait::async_trait;
use renderq_core::domain::job::Job;
use sqlx::PgPool;

use super::{BackingError, JobBacking};

pub struct PgBacking {
    pool: PgPool,
    tenant: String,
}

impl PgBacking {
    pub fn new(pool: PgPool, tenant: impl Into<String>) -> Self {
        Self {
            pool,
            tenant: tenant.into(),
        }
    }
}

#[async_trait]
impl JobBacking for PgBacking {
    async fn list(&self) -> Result<Vec<Job>, BackingError> {
        let rows = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT uid, body
            FROM jobs
            WHERE tenant = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(&self.tenant)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(JobRow::into_job).collect()
    }

    async fn get(&self, uid: &str) -> Result<Option<Job>, BackingError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT uid, body
            FROM jobs
            WHERE tenant = $1 AND uid = $2
            "#,
        )
        .bind(&self.tenant)
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        row.map(JobRow::into_job).transpose()
    }

    async fn put(&self, job: &Job) -> Result<(), BackingError> {
        let body = serde_json::to_value(job).map_err(|source| BackingError::Codec {
            uid: job.uid().to_string(),
            source,
        })?;

        sqlx::query(
            r#"
            INSERT INTO jobs (tenant, uid, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant, uid) DO UPDATE SET body = EXCLUDED.body
            "#,
        )
        .bind(&self.tenant)
        .bind(job.uid())
        .bind(body)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, uid: &str) -> Result<bool, BackingError> {
        let result = sqlx::query("DELETE FROM jobs WHERE tenant = $1 AND uid = $2")
            .bind(&self.tenant)
            .bind(uid)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, uids: &[String]) -> Result<usize, BackingError> {
        if uids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM jobs WHERE tenant = $1 AND uid = ANY($2)")
            .bind(&self.tenant)
            .bind(uids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() as usize)
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
    uid: String,
    body: serde_json::Value,
}

impl JobRow {
    fn into_job(self) -> Result<Job, BackingError> {
        serde_json::from_value(self.body).map_err(|source| BackingError::Codec {
            uid: self.uid,
            source,
        })
    }
}
