//! PostgreSQL adapters - Database implementations for the storage ports.
//!
//! - `PostgresSeriesStore` - Canonical series and observations
//! - `PostgresVersionStore` - Briefings and the row-locked version chain
//! - `PostgresAnnotationRepository` - Chat log and reviewer comments

mod annotation_repository;
mod series_store;
mod version_store;

pub use annotation_repository::PostgresAnnotationRepository;
pub use series_store::PostgresSeriesStore;
pub use version_store::PostgresVersionStore;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

/// Opens a connection pool sized from configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .max_lifetime(config.max_lifetime())
        .connect(&config.url)
        .await?;

    if config.run_migrations {
        run_migrations(&pool).await.map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;
    }

    tracing::info!(
        max_connections = config.max_connections,
        migrations = config.run_migrations,
        "Database pool ready"
    );
    Ok(pool)
}

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
