//! # Command Line Interface
//!
//! `start` runs the proxy; `version` prints the build version.

use crate::config::{load_config, ConfigOverrides};
use crate::{startup, APP_NAME, VERSION};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "secret-cache-proxy")]
#[command(about = "Read-through caching proxy for a remote secrets store")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the proxy server
    Start(StartArgs),

    /// Print the version
    Version,
}

#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen port override
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Organization ID override
    #[arg(long)]
    pub org_id: Option<String>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl StartArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            port: self.port,
            org_id: self.org_id.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start(args) => {
            let config = load_config(args.config.as_deref(), &args.overrides())
                .context("Failed to load configuration")?;
            startup::run(config).await.context("Proxy server failed")?;
        }
        Commands::Version => println!("{} {}", APP_NAME, VERSION),
    }

    Ok(())
}
