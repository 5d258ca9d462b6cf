use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::store::{EntryStore, SqlStore};

/// Open the store named by `database_url` and bring its schema up to date.
///
/// `sqlite:` URLs select the file-based backend (`sqlite::memory:` keeps
/// everything on a single connection); anything else is handed to Postgres.
pub async fn connect(database_url: &str) -> anyhow::Result<Arc<dyn EntryStore>> {
    if database_url.starts_with("sqlite:") {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid SQLite database URL")?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(5));
        if database_url.contains(":memory:") {
            // Every connection would get its own empty database.
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            pool_options = pool_options.max_connections(5);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to open SQLite database")?;

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .context("Failed to run SQLite migrations")?;

        tracing::info!(backend = "sqlite", "Database migrations applied");
        Ok(Arc::new(SqlStore::new(pool)))
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .context("Failed to create database pool")?;

        sqlx::migrate!("./migrations/postgres")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;

        tracing::info!(backend = "postgres", "Database migrations applied");
        Ok(Arc::new(SqlStore::new(pool)))
    }
}
