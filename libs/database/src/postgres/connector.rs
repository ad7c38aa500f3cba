use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

use super::PostgresConfig;
use crate::common::{DatabaseError, RetryConfig, retry_with_backoff};

async fn connect_with_options(options: ConnectOptions) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(options).await?;
    info!("Successfully connected to PostgreSQL database");
    Ok(db)
}

/// Open the connection pool, retrying with backoff while the server is unreachable.
///
/// Meant for startup, where the database container may still be booting.
pub async fn connect_from_config_with_retry(
    config: PostgresConfig,
    retry: RetryConfig,
) -> Result<DatabaseConnection, DatabaseError> {
    info!(
        url = %config.redacted_url(),
        max_retries = retry.max_retries,
        "Connecting to PostgreSQL"
    );
    let options = config.into_connect_options();

    retry_with_backoff(|| connect_with_options(options.clone()), retry)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))
}

/// Close the pool, waiting for checked-out connections to be returned
pub async fn disconnect(db: DatabaseConnection) -> Result<(), DatabaseError> {
    db.close().await?;
    info!("PostgreSQL connection pool closed");
    Ok(())
}
