use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS interview_sessions (
        id               TEXT PRIMARY KEY CHECK (id ~ '^[0-9a-f]{24}$'),
        name             TEXT NOT NULL,
        experience       TEXT NOT NULL,
        tech_stacks      TEXT[] NOT NULL DEFAULT '{}',
        projects         JSONB NOT NULL DEFAULT '[]',
        interview_status TEXT NOT NULL DEFAULT 'not-started'
            CHECK (interview_status IN ('not-started', 'waiting-for-answer', 'ended')),
        created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS turn_aggregates (
        session_id TEXT PRIMARY KEY REFERENCES interview_sessions (id) ON DELETE CASCADE,
        questions  TEXT[] NOT NULL,
        ratings    TEXT[] NOT NULL DEFAULT '{}',
        feedback   TEXT[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the interview tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to apply interview schema")?;
    }
    info!("Interview schema ready");
    Ok(())
}
