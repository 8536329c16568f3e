//! Connectivity check against the configured database

use crate::config::Config;
use crate::database::{ConnectionManager, Database};
use crate::driver::DriverRegistry;
use crate::postgres::PostgresDriver;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Registry holding the built-in drivers, configured from `config`
#[must_use]
pub fn registry_for(config: &Config) -> DriverRegistry {
    let mut postgres = PostgresDriver::new();
    if let Some(ca_cert) = &config.tls.ca_cert {
        postgres = postgres.with_ca_cert(ca_cert);
    }
    DriverRegistry::with_postgres_driver(postgres)
}

/// Handle ping command
#[allow(clippy::disallowed_methods)]
pub async fn handle_ping(config_path: &Path) -> Result<()> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let database = &config.database;

    println!(
        "🔌 Pinging {}:{}/{} ({})...",
        database.host, database.port, database.name, database.driver
    );

    let manager = ConnectionManager::new(registry_for(&config));
    let mut db = manager
        .create(CancellationToken::new(), database)
        .await
        .context("Failed to open connection")?;

    let elapsed = ping_then_close(&mut db).await?;

    info!("Ping succeeded in {:?}", elapsed);
    println!("✅ Server reachable ({} ms)", elapsed.as_millis());
    Ok(())
}

/// Ping once, then close. A ping failure wins over a close failure; a close
/// failure after a good ping is still an error.
pub async fn ping_then_close(db: &mut Database) -> Result<Duration> {
    let started = Instant::now();
    let ping_result = db.ping().await;
    let elapsed = started.elapsed();

    let close_result = db.close().await;

    match (ping_result, close_result) {
        (Err(ping_err), Err(close_err)) => {
            warn!("Failed to close connection after ping: {}", close_err);
            Err(ping_err).context("Ping failed")
        }
        (Err(ping_err), Ok(())) => Err(ping_err).context("Ping failed"),
        (Ok(()), Err(close_err)) => {
            Err(close_err).context("Ping succeeded but closing the connection failed")
        }
        (Ok(()), Ok(())) => Ok(elapsed),
    }
}
