use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use salespoint_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Pool with the [`DatabaseConfig`] defaults; tests and tooling that only
/// have a URL use this.
pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let defaults = DatabaseConfig::default();
    connect_with_settings(database_url, defaults.max_connections, defaults.timeout_secs).await
}

pub async fn connect_from(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&config.url, config.max_connections, config.timeout_secs).await
}

/// foreign_keys backs the sale -> sold_line and campaign -> campaign_product
/// references; WAL plus a busy timeout keeps concurrent sale mutations from
/// failing fast on SQLITE_BUSY while a reconciliation write is in flight.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}
