// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod devices;
pub mod server;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{Profile, ServerConfig};

/// Sortyx waste classifier CLI
#[derive(Parser, Debug)]
#[command(name = "sortyx-cli")]
#[command(version)]
#[command(about = "Classify waste images, run the API server, the capture client or the station", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the classify API server
    Serve(server::ServeArgs),

    /// Classify one image file and print the JSON response
    Classify(server::ClassifyArgs),

    /// Post frames to a classify server on an interval
    Capture(devices::CaptureArgs),

    /// Run the proximity-triggered sorting station
    Station(devices::StationArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => server::serve(args).await,
        Commands::Classify(args) => server::classify_file(args).await,
        Commands::Capture(args) => devices::capture(args).await,
        Commands::Station(args) => devices::station(args).await,
    }
}

/// Load configuration from a TOML file, or from `SORTYX_*` variables with an
/// optional profile override
pub fn load_config(config: Option<&Path>, profile: Option<Profile>) -> Result<ServerConfig> {
    if let Some(path) = config {
        return ServerConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()));
    }

    let config = ServerConfig::from_lookup(|key| match (key, profile) {
        ("SORTYX_PROFILE", Some(profile)) => Some(profile.to_string()),
        _ => std::env::var(key).ok(),
    })?;
    Ok(config)
}

/// Shared `--config`/`--profile` flags
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// TOML configuration file
    #[arg(long, env = "SORTYX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Preset to start from when no file is given
    #[arg(long, value_enum)]
    pub profile: Option<Profile>,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<ServerConfig> {
        load_config(self.config.as_deref(), self.profile)
    }
}
