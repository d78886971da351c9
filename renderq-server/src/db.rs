use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Jobs of every tenant, one JSONB record per job
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            tenant VARCHAR(255) NOT NULL,
            uid VARCHAR(64) NOT NULL,
            seq BIGSERIAL NOT NULL,
            body JSONB NOT NULL,
            PRIMARY KEY (tenant, uid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Hydration reads a tenant's jobs in insertion order
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_tenant_seq ON jobs(tenant, seq)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
