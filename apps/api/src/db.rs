use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const APPLICANTS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS applicants (
    id          UUID PRIMARY KEY,
    name        TEXT NOT NULL CHECK (name <> ''),
    phone_no    TEXT NOT NULL CHECK (phone_no <> ''),
    email       TEXT NOT NULL UNIQUE,
    resume_path TEXT NOT NULL CHECK (resume_path <> ''),
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

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

/// Creates the applicants table if it does not exist yet.
/// The UNIQUE(email) constraint is what rejects duplicate signups.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(APPLICANTS_SCHEMA).execute(pool).await?;
    info!("Applicants schema ready");
    Ok(())
}
