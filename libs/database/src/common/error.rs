/// Errors raised while managing the database connection itself.
///
/// Query-level failures are not funnelled through here; repositories receive
/// `sea_orm::DbErr` directly so they can classify it.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sea_orm::DbErr),

    /// Connection failed after retries
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),
}
