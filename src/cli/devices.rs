// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::ConfigArgs;
use crate::capture::{run_capture, CaptureClient, CaptureOptions};
use crate::config::ModelBackend;
use crate::station::{
    ConsoleDisplay, FrameSource, ImageFileSource, SimulatedSensors, Station, StationConfig,
    SyntheticSource,
};

/// Arguments for the capture command
#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Classify endpoint to post frames to
    #[arg(long, env = "SORTYX_CAPTURE_URL", default_value = "http://127.0.0.1:5000/classify")]
    pub url: String,

    /// Image file or directory standing in for the camera (synthetic frames if omitted)
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Seconds between frames
    #[arg(long, default_value_t = 2)]
    pub interval_secs: u64,

    /// Stop after this many frames
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// Save each frame before sending it
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

/// Arguments for the station command
#[derive(Args, Debug)]
pub struct StationArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Classify through a remote server instead of the configured backend
    #[arg(long, env = "SORTYX_STATION_REMOTE_URL")]
    pub remote_url: Option<String>,

    /// Image file or directory standing in for the camera (synthetic frames if omitted)
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Capture when the proximity reading is below this value
    #[arg(long, default_value_t = 20)]
    pub threshold: u8,

    /// Proximity check period in milliseconds
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub proximity_ms: u64,

    /// Sensor refresh period in milliseconds
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(1..))]
    pub sensor_ms: u64,

    /// Stop after this many seconds (runs until Ctrl-C otherwise)
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Seed for the simulated sensors
    #[arg(long)]
    pub seed: Option<u64>,
}

fn open_source(path: Option<&PathBuf>) -> Result<Box<dyn FrameSource>> {
    Ok(match path {
        Some(path) => Box::new(ImageFileSource::open(path)?),
        None => Box::new(SyntheticSource::default()),
    })
}

/// Cancel `token` on Ctrl-C, or after `limit` when given
fn cancel_on_signal(token: CancellationToken, limit: Option<Duration>) {
    tokio::spawn(async move {
        match limit {
            Some(limit) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = tokio::time::sleep(limit) => {}
                }
            }
            None => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
        token.cancel();
    });
}

pub async fn capture(args: CaptureArgs) -> Result<()> {
    let client = CaptureClient::new(&args.url, Duration::from_secs(args.timeout_secs))?;
    let mut source = open_source(args.source.as_ref())?;
    let options = CaptureOptions {
        interval: Duration::from_secs(args.interval_secs),
        max_frames: args.max_frames,
        save_path: args.save,
    };

    println!("Press Ctrl-C to quit.");
    let cancel = CancellationToken::new();
    cancel_on_signal(cancel.clone(), None);

    let sent = run_capture(&client, source.as_mut(), &options, cancel).await;
    info!("Capture finished: {} frames accepted", sent);
    Ok(())
}

pub async fn station(args: StationArgs) -> Result<()> {
    let mut config = args.config.load()?;
    if let Some(url) = args.remote_url {
        config.model.backend = ModelBackend::Remote;
        config.model.remote_url = Some(url);
    }
    // The station only shows the label
    config.chat.enabled = false;

    let pipeline = Arc::new(config.build_pipeline()?);
    let sensors = match args.seed {
        Some(seed) => SimulatedSensors::seeded(seed),
        None => SimulatedSensors::new(),
    };

    let station = Station::new(
        pipeline,
        open_source(args.source.as_ref())?,
        Box::new(sensors),
        Box::new(ConsoleDisplay::stdout()),
        StationConfig {
            proximity_interval: Duration::from_millis(args.proximity_ms),
            sensor_interval: Duration::from_millis(args.sensor_ms),
            proximity_threshold: args.threshold,
        },
    );

    println!("SORTYX Waste Classifier - Classification: Waiting...");
    let cancel = CancellationToken::new();
    cancel_on_signal(cancel.clone(), args.duration_secs.map(Duration::from_secs));

    let stats = station.run(cancel).await;
    println!(
        "Station stopped after {} checks, {} captures, {} errors",
        stats.proximity_checks, stats.captures, stats.errors
    );
    Ok(())
}
