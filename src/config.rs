use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Main configuration structure for `dbhandle`
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Database connection configuration
    pub database: DatabaseConfig,
    /// TLS settings for the built-in drivers
    #[serde(default)]
    pub tls: TlsSettings,
}

/// Database connection configuration
#[derive(Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Registered driver name, e.g. `postgres`
    pub driver: String,
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Database user
    pub user: String,
    /// Database password
    #[serde(default)]
    pub password: String,
    /// Environment variable containing the password
    #[serde(default)]
    pub password_env: Option<String>,
    /// Database name
    pub name: String,
    /// Schema placed on the search path
    pub schema: String,
}

/// TLS settings
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    /// PEM file with an extra CA certificate to trust
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

impl DatabaseConfig {
    /// Resolve the password to use for the connection.
    ///
    /// The variable named by `password_env` wins when it is set; otherwise the
    /// inline `password` is used.
    #[must_use]
    pub fn resolve_password(&self) -> String {
        let Some(password_env) = &self.password_env else {
            return self.password.clone();
        };

        debug!(
            "Reading password from environment variable: {}",
            password_env
        );
        env::var(password_env).unwrap_or_else(|_| {
            warn!(
                "Environment variable {} not found, using configured password",
                password_env
            );
            self.password.clone()
        })
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("password_env", &self.password_env)
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DatabaseConfig {
        DatabaseConfig {
            driver: "postgres".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            user: "u".to_string(),
            password: "hunter2".to_string(),
            password_env: None,
            name: "db".to_string(),
            schema: "public".to_string(),
        }
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(rendered.contains("localhost"));
    }

    #[test]
    fn test_resolve_password_inline() {
        assert_eq!(sample().resolve_password(), "hunter2");
    }

    #[test]
    fn test_resolve_password_missing_env_falls_back() {
        let config = DatabaseConfig {
            password_env: Some("DBHANDLE_TEST_SURELY_UNSET_VARIABLE".to_string()),
            ..sample()
        };
        assert_eq!(config.resolve_password(), "hunter2");
    }

    #[test]
    fn test_parse_without_tls_section() {
        let config: Config = toml::from_str(
            r#"
[database]
driver = "postgres"
host = "db.internal"
port = 6432
user = "app"
name = "app"
schema = "tenant_a"
"#,
        )
        .unwrap();

        assert_eq!(config.database.port, 6432);
        assert_eq!(config.database.password, "");
        assert!(config.database.password_env.is_none());
        assert!(config.tls.ca_cert.is_none());
    }
}
