use dbhandle::cli::{Cli, Commands};
use dbhandle::commands::{conninfo, ping};
use std::process;
use tracing_subscriber::EnvFilter;

// Allow println in main CLI binary
#[allow(clippy::disallowed_methods)]
fn main() {
    init_logging();

    let cli = Cli::parse();
    tracing::info!("dbhandle CLI initialized");

    let result = match cli.command {
        Some(Commands::Ping) => match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(ping::handle_ping(&cli.config)),
            Err(e) => Err(anyhow::anyhow!("Failed to start async runtime: {}", e)),
        },
        Some(Commands::Conninfo) => conninfo::handle_conninfo(&cli.config),
        None => {
            println!("dbhandle - Use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Initialize logging based on environment variables
fn init_logging() {
    // Default to INFO level, can be overridden by RUST_LOG environment variable
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dbhandle=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
