//! # Database Connection Handle
//!
//! [`ConnectionManager`] turns a [`DatabaseConfig`] into an open [`Database`]
//! handle using an explicitly supplied [`DriverRegistry`]. The handle exposes
//! the connection lifecycle only: `ping` and `close`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dbhandle::{ConnectionManager, DriverRegistry, config::DatabaseConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatabaseConfig {
//!     driver: "postgres".to_string(),
//!     host: "localhost".to_string(),
//!     port: 5432,
//!     user: "postgres".to_string(),
//!     password: String::new(),
//!     password_env: Some("DB_PASSWORD".to_string()),
//!     name: "app".to_string(),
//!     schema: "public".to_string(),
//! };
//!
//! let manager = ConnectionManager::new(DriverRegistry::with_postgres());
//! let mut db = manager.create(CancellationToken::new(), &config).await?;
//! db.ping().await?;
//! db.close().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::DatabaseConfig;
use crate::conninfo;
use crate::driver::{DriverConnection, DriverRegistry};
use crate::error::{CloseError, ConnectivityError, DriverError};
use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Lifecycle operations of an open connection
#[async_trait]
pub trait ConnectionLifecycle: Send + Sync {
    /// Release the connection. Fails if it was already released.
    async fn close(&mut self) -> Result<(), CloseError>;

    /// Verify the server is reachable with a single round-trip
    async fn ping(&self) -> Result<(), ConnectivityError>;
}

/// Opens [`Database`] handles through a registry of drivers
#[derive(Debug, Clone, Default)]
pub struct ConnectionManager {
    registry: DriverRegistry,
}

impl ConnectionManager {
    /// Create a manager over the given drivers
    #[must_use]
    pub const fn new(registry: DriverRegistry) -> Self {
        Self { registry }
    }

    /// Registered drivers
    #[must_use]
    pub const fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// Open a handle for `config`.
    ///
    /// The returned handle is not known to be reachable; call
    /// [`Database::ping`] to check. Fails when `config.driver` is not
    /// registered or the driver rejects the connection string.
    pub async fn create(
        &self,
        context: CancellationToken,
        config: &DatabaseConfig,
    ) -> Result<Database, DriverError> {
        info!(
            "Opening {} connection to {}:{}/{}",
            config.driver, config.host, config.port, config.name
        );

        let Some(driver) = self.registry.get(&config.driver) else {
            let err = DriverError::UnknownDriver(config.driver.clone());
            error!("Failed to open database connection: {}", err);
            return Err(err);
        };

        let conninfo = conninfo::build(config, &config.resolve_password());
        let connection = driver.open(&conninfo).await.map_err(|e| {
            error!("Failed to open database connection: {}", e);
            e
        })?;

        debug!("Opened {} connection", config.driver);
        Ok(Database {
            context,
            driver: config.driver.clone(),
            connection: Some(connection),
        })
    }
}

/// An open database connection, exclusively owned until closed
pub struct Database {
    context: CancellationToken,
    driver: String,
    connection: Option<Box<dyn DriverConnection>>,
}

impl Database {
    /// Wrap an already opened driver connection
    #[must_use]
    pub fn from_connection(
        context: CancellationToken,
        driver: impl Into<String>,
        connection: Box<dyn DriverConnection>,
    ) -> Self {
        Self {
            context,
            driver: driver.into(),
            connection: Some(connection),
        }
    }

    /// Context the handle was created with
    #[must_use]
    pub const fn context(&self) -> &CancellationToken {
        &self.context
    }

    /// Name of the driver that opened the connection
    #[must_use]
    pub fn driver_name(&self) -> &str {
        &self.driver
    }

    /// Whether `close` has been called
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.connection.is_none()
    }

    /// Release the connection.
    ///
    /// The handle is closed afterwards even when the driver reports an error.
    pub async fn close(&mut self) -> Result<(), CloseError> {
        let Some(mut connection) = self.connection.take() else {
            warn!("Close called on an already closed {} connection", self.driver);
            return Err(CloseError::AlreadyClosed);
        };

        connection.close().await.map_err(|e| {
            error!("Failed to close {} connection: {}", self.driver, e);
            CloseError::Driver(e)
        })?;

        debug!("Closed {} connection", self.driver);
        Ok(())
    }

    /// Single round-trip liveness check
    pub async fn ping(&self) -> Result<(), ConnectivityError> {
        let connection = self.connection.as_ref().ok_or(ConnectivityError::Closed)?;
        connection.ping().await.map_err(|e| {
            debug!("Ping on {} connection failed: {}", self.driver, e);
            ConnectivityError::Driver(e)
        })
    }
}

#[async_trait]
impl ConnectionLifecycle for Database {
    async fn close(&mut self) -> Result<(), CloseError> {
        Database::close(self).await
    }

    async fn ping(&self) -> Result<(), ConnectivityError> {
        Database::ping(self).await
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("driver", &self.driver)
            .field("closed", &self.is_closed())
            .field("cancelled", &self.context.is_cancelled())
            .finish()
    }
}
