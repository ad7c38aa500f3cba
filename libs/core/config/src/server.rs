use crate::{ConfigError, FromEnv, env_or_default, env_parse};

/// Address a service advertises. Message-driven services only log it.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromEnv for ServerConfig {
    /// - HOST: defaults to 0.0.0.0
    /// - PORT: defaults to 8080
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_or_default("HOST", "0.0.0.0"),
            port: env_parse("PORT", "8080")?,
        })
    }
}
