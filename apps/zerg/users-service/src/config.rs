//! Configuration for the users service

use core_config::{Environment, FromEnv, NatsConfig, ServerConfig};
use database::RetryConfig;
use database::postgres::PostgresConfig;
use eyre::WrapErr;

/// Application-specific configuration
/// Composes shared config components from the `core_config` and `database` libraries
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    /// Informational only, requests arrive over NATS
    pub server: ServerConfig,
    pub nats: NatsConfig,
    pub database: PostgresConfig,
    pub db_retry: RetryConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env().wrap_err("Failed to load server configuration")?;
        let nats = NatsConfig::from_env().wrap_err("Failed to load NATS configuration")?;
        let database =
            PostgresConfig::from_env().wrap_err("Failed to load PostgreSQL configuration")?;
        let db_retry =
            RetryConfig::from_env().wrap_err("Failed to load database retry configuration")?;

        Ok(Self {
            environment,
            server,
            nats,
            database,
            db_retry,
        })
    }
}
