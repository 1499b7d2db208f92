// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Headless sorting station
//!
//! Two timers drive the station: a sensor timer refreshes the status panel
//! and a proximity timer triggers capture → classify → display whenever an
//! item is close enough. Both run in one task, so a slow classification
//! delays the next tick instead of overlapping it.

pub mod display;
pub mod sensors;
pub mod source;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use display::{ConsoleDisplay, ResultTone, StationDisplay};
pub use sensors::{SensorReader, SensorReadings, SimulatedSensors};
pub use source::{FrameSource, ImageFileSource, SourceError, SyntheticSource};

use crate::pipeline::{ClassifyPipeline, RunOptions};

/// Shortest timer period the loop will run with
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct StationConfig {
    pub proximity_interval: Duration,
    pub sensor_interval: Duration,
    /// Capture when the proximity reading is strictly below this value
    pub proximity_threshold: u8,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            proximity_interval: Duration::from_millis(1000),
            sensor_interval: Duration::from_millis(500),
            proximity_threshold: 20,
        }
    }
}

/// Counters reported when the loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StationStats {
    pub proximity_checks: u64,
    pub sensor_updates: u64,
    pub captures: u64,
    pub errors: u64,
}

pub struct Station {
    pipeline: Arc<ClassifyPipeline>,
    source: Box<dyn FrameSource>,
    sensors: Box<dyn SensorReader>,
    display: Box<dyn StationDisplay>,
    config: StationConfig,
    stats: StationStats,
}

impl Station {
    pub fn new(
        pipeline: Arc<ClassifyPipeline>,
        source: Box<dyn FrameSource>,
        sensors: Box<dyn SensorReader>,
        display: Box<dyn StationDisplay>,
        config: StationConfig,
    ) -> Self {
        Self {
            pipeline,
            source,
            sensors,
            display,
            config,
            stats: StationStats::default(),
        }
    }

    pub fn stats(&self) -> StationStats {
        self.stats
    }

    /// Refresh and render the sensor panel
    pub fn refresh_sensors(&mut self) -> SensorReadings {
        let readings = self.sensors.read();
        self.display.show_sensors(&readings);
        self.stats.sensor_updates += 1;
        readings
    }

    /// One proximity check; returns the label when a capture was triggered
    pub async fn check_proximity(&mut self) -> Option<String> {
        self.stats.proximity_checks += 1;
        let proximity = self.sensors.proximity();
        if proximity >= self.config.proximity_threshold {
            return None;
        }

        debug!(
            "Proximity {} below threshold {}, capturing",
            proximity, self.config.proximity_threshold
        );
        self.capture_and_classify().await
    }

    /// Capture one frame, classify it and render the outcome
    pub async fn capture_and_classify(&mut self) -> Option<String> {
        self.stats.captures += 1;

        let frame = match self.source.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                self.report_error(&e.to_string());
                return None;
            }
        };

        match self.pipeline.run(&frame, RunOptions::classify_only()).await {
            Ok(outcome) => {
                info!(
                    "Station classified frame as {} ({}%)",
                    outcome.label,
                    outcome.confidence_percent()
                );
                self.display
                    .show_result(&outcome.label, ResultTone::for_label(&outcome.label));
                Some(outcome.label)
            }
            Err(e) => {
                self.report_error(&e.to_string());
                None
            }
        }
    }

    fn report_error(&mut self, message: &str) {
        warn!("Station capture failed: {}", message);
        self.stats.errors += 1;
        self.display.show_error(message);
    }

    /// Run both timers until `cancel` fires
    pub async fn run(mut self, cancel: CancellationToken) -> StationStats {
        info!(
            "Station started: source={}, classifier={}, threshold={}",
            self.source.describe(),
            self.pipeline.classifier_name(),
            self.config.proximity_threshold
        );

        // tokio's interval panics on a zero period
        let mut proximity_timer = interval(self.config.proximity_interval.max(MIN_INTERVAL));
        proximity_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sensor_timer = interval(self.config.sensor_interval.max(MIN_INTERVAL));
        sensor_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = sensor_timer.tick() => {
                    self.refresh_sensors();
                }
                _ = proximity_timer.tick() => {
                    self.check_proximity().await;
                }
            }
        }

        info!("Station stopped: {:?}", self.stats);
        self.stats
    }
}
