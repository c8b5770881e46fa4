//! Suburi - inertial capture ingestion service
//!
//! # Usage
//!
//! ```bash
//! # Run the server (default)
//! suburi
//! suburi serve --config configs/suburi.toml
//! ```

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Suburi - inertial capture ingestion service
#[derive(Parser, Debug)]
#[command(name = "suburi")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file
    #[arg(short, long, default_value = "configs/suburi.toml", global = true)]
    config: std::path::PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the ingestion server
    Serve(cmd::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Serve(args)) => {
            init_logging(&args.log_level)?;
            cmd::serve::run(args).await
        }
        // No subcommand = run the server
        None => {
            init_logging(&cli.log_level)?;
            let args = cmd::serve::ServeArgs {
                config: cli.config,
                log_level: cli.log_level,
            };
            cmd::serve::run(args).await
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    Ok(())
}
