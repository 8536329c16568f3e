//! Print the connection string a configuration produces

use crate::config::Config;
use crate::conninfo::{self, ConnInfo};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Redacted connection string for the configuration at `config_path`
pub fn render_conninfo(config_path: &Path) -> Result<String> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let built = conninfo::build(&config.database, &config.database.resolve_password());
    let parsed: ConnInfo = built
        .parse()
        .context("Configuration produced an unparsable connection string")?;

    debug!("Rendered connection string for driver {}", config.database.driver);
    Ok(parsed.redacted())
}

/// Handle conninfo command
#[allow(clippy::disallowed_methods)]
pub fn handle_conninfo(config_path: &Path) -> Result<()> {
    println!("{}", render_conninfo(config_path)?);
    Ok(())
}
