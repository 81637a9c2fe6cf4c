use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

// Catalog reads dominate; uploads stream to disk, not the database, so a
// modest pool is enough.
const MAX_CONNECTIONS: u32 = 10;
const MIN_CONNECTIONS: u32 = 1;

/// Open the pooled database connection used by the whole application.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn connect(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url);
    opts.max_connections(MAX_CONNECTIONS)
        .min_connections(MIN_CONNECTIONS)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    Ok(Database::connect(opts).await?)
}
