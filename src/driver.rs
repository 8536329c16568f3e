//! Driver seam and explicit driver registration.
//!
//! A [`Driver`] turns a connection string into a [`DriverConnection`]. Drivers
//! are looked up by name in a [`DriverRegistry`] that the host application
//! builds during initialization and hands to the
//! [`ConnectionManager`](crate::database::ConnectionManager).

use crate::error::{BoxError, DriverError};
use crate::postgres::PostgresDriver;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Name the built-in PostgreSQL driver is registered under
pub const POSTGRES: &str = "postgres";

/// A database driver able to open connections from a connection string
#[async_trait]
pub trait Driver: Send + Sync {
    /// Open a connection.
    ///
    /// Implementations allocate local resources only; reaching the server is
    /// left to [`DriverConnection::ping`].
    async fn open(&self, conninfo: &str) -> Result<Box<dyn DriverConnection>, DriverError>;
}

/// An opened driver connection
#[async_trait]
pub trait DriverConnection: Send + Sync {
    /// One round-trip to the server
    async fn ping(&self) -> Result<(), BoxError>;

    /// Release every local resource held by the connection
    async fn close(&mut self) -> Result<(), BoxError>;
}

/// Explicit mapping from driver name to driver implementation
#[derive(Clone, Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn Driver>>,
}

impl DriverRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in PostgreSQL driver under `"postgres"`
    #[must_use]
    pub fn with_postgres() -> Self {
        Self::with_postgres_driver(PostgresDriver::new())
    }

    /// Create a registry with a customised PostgreSQL driver under `"postgres"`
    #[must_use]
    pub fn with_postgres_driver(driver: PostgresDriver) -> Self {
        let mut drivers: HashMap<String, Arc<dyn Driver>> = HashMap::new();
        drivers.insert(POSTGRES.to_string(), Arc::new(driver));
        Self { drivers }
    }

    /// Register `driver` under `name`. Names are unique.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        driver: Arc<dyn Driver>,
    ) -> Result<(), DriverError> {
        let name = name.into();
        if self.drivers.contains_key(&name) {
            return Err(DriverError::AlreadyRegistered(name));
        }
        debug!("Registering database driver: {}", name);
        self.drivers.insert(name, driver);
        Ok(())
    }

    /// Look a driver up by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers.get(name).cloned()
    }

    /// Whether a driver is registered under `name`
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    /// Registered driver names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullDriver;

    #[async_trait]
    impl Driver for NullDriver {
        async fn open(&self, _conninfo: &str) -> Result<Box<dyn DriverConnection>, DriverError> {
            Err(DriverError::Open("null driver never opens".into()))
        }
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = DriverRegistry::new();
        assert!(registry.names().is_empty());
        assert!(registry.get("").is_none());
        assert!(registry.get(POSTGRES).is_none());
    }

    #[test]
    fn test_with_postgres_registers_builtin() {
        let registry = DriverRegistry::with_postgres();
        assert!(registry.contains(POSTGRES));
        assert_eq!(registry.names(), vec![POSTGRES]);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = DriverRegistry::new();
        registry.register("null", Arc::new(NullDriver)).unwrap();

        let err = registry.register("null", Arc::new(NullDriver)).unwrap_err();
        assert!(matches!(err, DriverError::AlreadyRegistered(name) if name == "null"));
    }

    #[test]
    fn test_names_are_sorted() {
        let mut registry = DriverRegistry::with_postgres();
        registry.register("mysql", Arc::new(NullDriver)).unwrap();
        registry.register("cockroach", Arc::new(NullDriver)).unwrap();
        assert_eq!(registry.names(), vec!["cockroach", "mysql", "postgres"]);
        assert_eq!(
            format!("{registry:?}"),
            r#"DriverRegistry { drivers: ["cockroach", "mysql", "postgres"] }"#
        );
    }
}
