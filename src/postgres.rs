//! # PostgreSQL driver
//!
//! Built-in [`Driver`] backed by `tokio-postgres`, pooled internally with bb8
//! and encrypted with rustls.
//!
//! Opening never touches the network: the pool is built unchecked. A
//! [`DriverConnection::ping`] makes exactly one connection attempt, bounded by
//! the connect timeout, and reports the `tokio_postgres::Error` unchanged.

use crate::conninfo::ConnInfo;
use crate::driver::{Driver, DriverConnection};
use crate::error::{BoxError, DriverError};
use crate::tls;
use async_trait::async_trait;
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::debug;

type PostgresPool = Pool<PostgresConnectionManager<MakeRustlsConnect>>;

const DEFAULT_MAX_SIZE: u32 = 10;
const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// PostgreSQL driver
#[derive(Debug, Clone)]
pub struct PostgresDriver {
    max_size: u32,
    connection_timeout: Duration,
    ca_cert: Option<PathBuf>,
}

impl Default for PostgresDriver {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            ca_cert: None,
        }
    }
}

impl PostgresDriver {
    /// Driver with the default pool size and timeout, trusting the standard roots
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of pooled server connections per handle
    #[must_use]
    pub const fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Upper bound on establishing a server connection, used unless the
    /// connection string sets `connect_timeout`
    #[must_use]
    pub const fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Also trust the CA certificates in the given PEM file
    #[must_use]
    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    /// Maximum pool size
    #[must_use]
    pub const fn max_size(&self) -> u32 {
        self.max_size
    }

    /// Connection timeout
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    /// Extra CA file, if any
    #[must_use]
    pub fn ca_cert(&self) -> Option<&Path> {
        self.ca_cert.as_deref()
    }
}

/// Translate libpq-style parameters into a `tokio_postgres::Config`.
///
/// `search_path` is sent as a startup option, the way libpq-based drivers do.
pub fn pg_config(params: &ConnInfo) -> Result<tokio_postgres::Config, DriverError> {
    let mut config = tokio_postgres::Config::new();

    for (key, value) in params.iter() {
        match key {
            "host" => {
                config.host(value);
            }
            "port" => {
                let port = value.parse::<u16>().map_err(|_| {
                    DriverError::InvalidConnectionString(format!("invalid port {value:?}"))
                })?;
                config.port(port);
            }
            "user" => {
                config.user(value);
            }
            "password" => {
                config.password(value);
            }
            "dbname" => {
                if !value.is_empty() {
                    config.dbname(value);
                }
            }
            "search_path" => {
                if !value.is_empty() {
                    config.options(&format!("-c search_path={}", escape_option(value)));
                }
            }
            "sslmode" => {
                config.ssl_mode(parse_ssl_mode(value)?);
            }
            "application_name" => {
                config.application_name(value);
            }
            "connect_timeout" => {
                let seconds = value.parse::<u64>().map_err(|_| {
                    DriverError::InvalidConnectionString(format!(
                        "invalid connect_timeout {value:?}"
                    ))
                })?;
                if seconds > 0 {
                    config.connect_timeout(Duration::from_secs(seconds));
                }
            }
            other => {
                return Err(DriverError::InvalidConnectionString(format!(
                    "unknown keyword {other:?}"
                )));
            }
        }
    }

    Ok(config)
}

fn parse_ssl_mode(value: &str) -> Result<SslMode, DriverError> {
    match value {
        "disable" => Ok(SslMode::Disable),
        "prefer" => Ok(SslMode::Prefer),
        "require" => Ok(SslMode::Require),
        other => Err(DriverError::InvalidConnectionString(format!(
            "unsupported sslmode {other:?}: expected disable, prefer or require"
        ))),
    }
}

// Startup options are split on unescaped whitespace.
fn escape_option(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_whitespace() || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl Driver for PostgresDriver {
    async fn open(&self, conninfo: &str) -> Result<Box<dyn DriverConnection>, DriverError> {
        let params: ConnInfo = conninfo
            .parse()
            .map_err(|e: crate::error::ConnInfoError| {
                DriverError::InvalidConnectionString(e.to_string())
            })?;
        let mut config = pg_config(&params)?;
        if config.get_connect_timeout().is_none() {
            config.connect_timeout(self.connection_timeout);
        }

        debug!("Opening PostgreSQL connection: {}", params.redacted());

        let tls_config =
            tls::client_config(self.ca_cert.as_deref()).map_err(|e| DriverError::Open(e.into()))?;
        let manager = PostgresConnectionManager::new(config, MakeRustlsConnect::new(tls_config));

        debug!(
            "Building connection pool with max_size={} connection_timeout={:?}",
            self.max_size, self.connection_timeout
        );
        let pool = Pool::builder()
            .max_size(self.max_size)
            .connection_timeout(self.connection_timeout)
            .build_unchecked(manager);

        Ok(Box::new(PostgresConnection { pool: Some(pool) }))
    }
}

struct PostgresConnection {
    pool: Option<PostgresPool>,
}

#[async_trait]
impl DriverConnection for PostgresConnection {
    async fn ping(&self) -> Result<(), BoxError> {
        let pool = self
            .pool
            .as_ref()
            .ok_or("postgres: connection pool is closed")?;
        // A dedicated connection reports connect failures as they happen;
        // a pooled checkout would only surface a timeout.
        let client = pool.dedicated_connection().await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BoxError> {
        match self.pool.take() {
            Some(pool) => {
                let state = pool.state();
                debug!(
                    "Closing connection pool ({} connections, {} idle)",
                    state.connections, state.idle_connections
                );
                drop(pool);
                Ok(())
            }
            None => Err("postgres: connection pool is already closed".into()),
        }
    }
}
