use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "dbhandle.toml";

/// Main CLI interface for `dbhandle`
#[derive(Parser)]
#[command(name = "dbhandle")]
#[command(version = crate::VERSION)]
#[command(about = "dbhandle - Open, ping and close a database connection")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// The command to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Open a connection, ping the server once and close it
    Ping,
    /// Print the connection string with the password redacted
    Conninfo,
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["dbhandle", "ping"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(matches!(cli.command, Some(Commands::Ping)));
    }

    #[test]
    fn test_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["dbhandle", "conninfo", "--config", "other.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(matches!(cli.command, Some(Commands::Conninfo)));
    }
}
