use crate::{ConfigError, FromEnv, env_or_default, env_parse};

/// NATS broker configuration for request/reply services
#[derive(Clone, Debug)]
pub struct NatsConfig {
    /// Broker endpoints, tried in order by the client
    pub servers: Vec<String>,
    /// Connection name reported to the broker
    pub client_name: String,
    /// Queue group shared by all instances of the service
    pub queue_group: String,
    /// Upper bound on requests handled at the same time
    pub max_concurrent_handlers: usize,
}

impl NatsConfig {
    /// Comma-separated server list, the format `async_nats::connect` accepts
    pub fn server_list(&self) -> String {
        self.servers.join(",")
    }
}

/// Splits a comma-separated list, dropping empty entries
fn parse_servers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl FromEnv for NatsConfig {
    /// Reads from environment variables with sensible defaults:
    /// - NATS_SERVERS: defaults to nats://localhost:4222
    /// - NATS_CLIENT_NAME: defaults to users-service
    /// - NATS_QUEUE_GROUP: defaults to users-service
    /// - MAX_CONCURRENT_HANDLERS: defaults to 64
    fn from_env() -> Result<Self, ConfigError> {
        let servers = parse_servers(&env_or_default("NATS_SERVERS", "nats://localhost:4222"));
        if servers.is_empty() {
            return Err(ConfigError::invalid(
                "NATS_SERVERS",
                "at least one server is required",
            ));
        }

        let client_name = env_or_default("NATS_CLIENT_NAME", "users-service");
        let queue_group = env_or_default("NATS_QUEUE_GROUP", "users-service");

        let max_concurrent_handlers: usize = env_parse("MAX_CONCURRENT_HANDLERS", "64")?;
        if max_concurrent_handlers == 0 {
            return Err(ConfigError::invalid(
                "MAX_CONCURRENT_HANDLERS",
                "must be greater than zero",
            ));
        }

        Ok(Self {
            servers,
            client_name,
            queue_group,
            max_concurrent_handlers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 4] = [
        "NATS_SERVERS",
        "NATS_CLIENT_NAME",
        "NATS_QUEUE_GROUP",
        "MAX_CONCURRENT_HANDLERS",
    ];

    #[test]
    fn test_nats_config_from_env_with_defaults() {
        temp_env::with_vars_unset(VARS, || {
            let config = NatsConfig::from_env().unwrap();
            assert_eq!(config.servers, vec!["nats://localhost:4222".to_string()]);
            assert_eq!(config.client_name, "users-service");
            assert_eq!(config.queue_group, "users-service");
            assert_eq!(config.max_concurrent_handlers, 64);
        });
    }

    #[test]
    fn test_nats_config_multiple_servers() {
        temp_env::with_var(
            "NATS_SERVERS",
            Some("nats://a:4222, nats://b:4222,,"),
            || {
                let config = NatsConfig::from_env().unwrap();
                assert_eq!(config.servers.len(), 2);
                assert_eq!(config.server_list(), "nats://a:4222,nats://b:4222");
            },
        );
    }

    #[test]
    fn test_nats_config_empty_servers() {
        temp_env::with_var("NATS_SERVERS", Some(" , "), || {
            let err = NatsConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("NATS_SERVERS"));
        });
    }

    #[test]
    fn test_nats_config_invalid_concurrency() {
        temp_env::with_var("MAX_CONCURRENT_HANDLERS", Some("lots"), || {
            let err = NatsConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("MAX_CONCURRENT_HANDLERS"));
        });

        temp_env::with_var("MAX_CONCURRENT_HANDLERS", Some("0"), || {
            assert!(NatsConfig::from_env().is_err());
        });
    }
}
