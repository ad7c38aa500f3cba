//! Users Service
//!
//! Request/reply microservice for the users resource. Each pattern is a
//! NATS subject; replies use the NestJS envelope so existing gateway
//! clients keep working.
//!
//! ## Architecture
//!
//! ```text
//! NATS (queue group: users-service)
//!   ↓ create_user | find_all_users | find_one_user | update_user | delete_user
//! UserRequestHandler<NatsBroker, PgUserRepository>
//!   ↓
//! UserDispatcher → UserService
//!   ↓
//! PostgreSQL (users table)
//! ```

pub mod config;
pub mod handlers;
pub mod messaging;

use crate::config::Config;
use crate::handlers::UserRequestHandler;
use crate::messaging::NatsBroker;
use database::postgres::{check_health, connect_from_config_with_retry, disconnect};
use domain_users::{PATTERNS, PgUserRepository, UserDispatcher, UserService};
use eyre::{Result, WrapErr};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// Run the users service
///
/// Startup order: tracing, configuration, PostgreSQL (with retry and a
/// health check), NATS, then one queue subscription per pattern. On
/// SIGINT/SIGTERM it stops accepting requests, finishes the ones in flight,
/// flushes NATS and closes the pool.
///
/// # Errors
///
/// Returns an error if configuration is invalid, PostgreSQL or NATS cannot
/// be reached, or a subscription fails.
pub async fn run() -> Result<()> {
    core_config::tracing::install_color_eyre();

    let environment = core_config::Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    let config = Config::from_env()?;
    info!(
        environment = ?config.environment,
        address = %config.server.address(),
        "Starting users service"
    );

    info!(url = %config.database.redacted_url(), "Connecting to PostgreSQL...");
    let db = connect_from_config_with_retry(config.database.clone(), config.db_retry.clone())
        .await
        .wrap_err("Failed to connect to PostgreSQL")?;
    check_health(&db)
        .await
        .wrap_err("PostgreSQL health check failed")?;
    info!("Connected to PostgreSQL successfully");

    let repository = PgUserRepository::new(db.clone());
    let dispatcher = UserDispatcher::new(UserService::new(repository));

    let broker = NatsBroker::connect(&config.nats).await?;
    info!(
        servers = %config.nats.server_list(),
        client_name = %config.nats.client_name,
        "Connected to NATS"
    );

    let handler = Arc::new(UserRequestHandler::new(
        Arc::new(broker),
        dispatcher,
        config.nats.queue_group.clone(),
        config.nats.max_concurrent_handlers,
    ));

    let shutdown = async {
        if let Err(e) = shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
    };
    let served = handler.run(&PATTERNS, shutdown).await;

    // Close the pool even when serving failed
    if let Err(e) = disconnect(db).await {
        error!(error = %e, "Failed to close PostgreSQL pool");
    }

    served?;
    info!("Users service stopped");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
        .wrap_err("Failed to install SIGTERM handler")?;

    #[cfg(unix)]
    let terminate = async move {
        terminate.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = signal::ctrl_c() => {
            result.wrap_err("Failed to listen for Ctrl+C")?;
            info!("Received Ctrl+C, initiating shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        },
    }

    Ok(())
}
