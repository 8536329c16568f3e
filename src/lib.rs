//! `dbhandle` - A minimal database connection handle
//!
//! Builds a connection string from configuration, opens it through an
//! explicitly registered driver and exposes `ping` and `close`.

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    missing_docs,
    rust_2018_idioms
)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/// Command line interface
pub mod cli;
/// CLI command handlers
pub mod commands;
/// Configuration management for `dbhandle`
pub mod config;
pub mod conninfo;
/// Connection manager and database handle
pub mod database;
pub mod driver;
/// Error types
pub mod error;
pub mod postgres;
pub mod tls;

pub use config::{Config, DatabaseConfig};
pub use database::{ConnectionLifecycle, ConnectionManager, Database};
pub use driver::{Driver, DriverConnection, DriverRegistry};
pub use error::{CloseError, ConnectivityError, DriverError};
pub use postgres::PostgresDriver;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
