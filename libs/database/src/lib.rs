//! PostgreSQL connectivity for zerg services
//!
//! Wraps SeaORM's connection pool with environment-driven configuration,
//! connect-with-retry for startup races against the database container, and a
//! health probe.
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::postgres::{self, PostgresConfig};
//! use database::common::RetryConfig;
//!
//! let config = PostgresConfig::from_env()?;
//! let db = postgres::connect_from_config_with_retry(config, RetryConfig::from_env()?).await?;
//! postgres::check_health(&db).await?;
//! // ... serve ...
//! postgres::disconnect(db).await?;
//! ```

pub mod common;
pub mod postgres;

pub use common::{DatabaseError, RetryConfig};
