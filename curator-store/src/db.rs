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
    // Job records; seq orders jobs created within the same instant
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            job_id UUID PRIMARY KEY,
            seq BIGSERIAL NOT NULL,
            status VARCHAR(20) NOT NULL,
            input JSONB NOT NULL,
            result JSONB,
            error_message TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_created ON jobs(created_at DESC, seq DESC)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_expires_at ON jobs(expires_at)")
        .execute(pool)
        .await?;

    // Task queue, independent of the jobs table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job_queue (
            id BIGSERIAL PRIMARY KEY,
            job_id UUID NOT NULL,
            priority SMALLINT NOT NULL,
            enqueued_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            delivery_count INTEGER NOT NULL DEFAULT 0,
            locked_by VARCHAR(255),
            locked_until TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_job_queue_ready ON job_queue(locked_until, priority DESC, id)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
