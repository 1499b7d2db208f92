// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::ConfigArgs;
use crate::api::classify::ClassifyResponse;
use crate::api::{start_server, AppState, ApiError};
use crate::config::ResponseShape;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override the listen port
    #[arg(long)]
    pub port: Option<u16>,
}

/// Arguments for the classify command
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Image file to classify
    pub file: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Response shape to print (defaults to the configured one)
    #[arg(long, value_enum)]
    pub shape: Option<ResponseShape>,
}

pub async fn serve(args: ServeArgs) -> Result<()> {
    let mut config = args.config.load()?;
    if let Some(port) = args.port {
        let addr = config.socket_addr()?;
        config.listen_addr = format!("{}:{}", addr.ip(), port);
    }

    println!("🚀 Starting Sortyx ({} profile)...", config.profile);
    let pipeline = config.build_pipeline()?;
    start_server(AppState::new(config, pipeline)).await
}

pub async fn classify_file(args: ClassifyArgs) -> Result<()> {
    let config = args.config.load()?;
    let shape = args.shape.unwrap_or(config.response_shape);
    let pipeline = config.build_pipeline()?;

    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;

    let options = shape.run_options();

    let outcome = pipeline
        .run_bytes(&bytes, options)
        .await
        .map_err(|e| ApiError::from_pipeline(e, true))?;
    info!(
        "{}: {} ({}%)",
        args.file.display(),
        outcome.label,
        outcome.confidence_percent()
    );

    let response = ClassifyResponse::from_outcome(shape, outcome);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
