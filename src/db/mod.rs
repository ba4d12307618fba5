use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Creates the connection pool shared by the auth routes and the usage ledger
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    log::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .max_lifetime(Some(config.max_lifetime))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                // Ledger timestamps are compared as UTC instants
                sqlx::query("SET timezone = 'UTC'").execute(&mut *conn).await?;
                sqlx::query("SET application_name = 'studyquota'")
                    .execute(conn)
                    .await?;
                Ok(())
            })
        })
        .connect(&config.url)
        .await?;

    log::info!(
        "Database pool ready (max: {}, min: {}, acquire timeout: {:?})",
        config.max_connections,
        config.min_connections,
        config.acquire_timeout
    );

    Ok(pool)
}

/// Applies the embedded migrations (users, usage_entries)
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    log::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations completed");
    Ok(())
}

/// Readiness probe
pub async fn health_check(pool: &DbPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
