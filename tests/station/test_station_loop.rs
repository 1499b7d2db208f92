// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Station loop tests: proximity gating, result tone, error display, shutdown

use async_trait::async_trait;
use image::DynamicImage;
use mockall::mock;
use sortyx::{
    classifier::StubClassifier,
    pipeline::{ClassifyPipeline, PipelineSettings},
    station::{
        ResultTone, SensorReader, SensorReadings, SourceError, Station, StationConfig,
        StationDisplay, SyntheticSource, FrameSource,
    },
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

mock! {
    pub Sensors {}

    impl SensorReader for Sensors {
        fn read(&mut self) -> SensorReadings;
        fn proximity(&mut self) -> u8;
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Shown {
    Result(String, ResultTone),
    Error(String),
    Sensors(SensorReadings),
}

#[derive(Clone, Default)]
struct RecordingDisplay {
    shown: Arc<Mutex<Vec<Shown>>>,
}

impl RecordingDisplay {
    fn shown(&self) -> Vec<Shown> {
        self.shown.lock().unwrap().clone()
    }
}

impl StationDisplay for RecordingDisplay {
    fn show_result(&mut self, label: &str, tone: ResultTone) {
        self.shown
            .lock()
            .unwrap()
            .push(Shown::Result(label.to_string(), tone));
    }

    fn show_error(&mut self, message: &str) {
        self.shown
            .lock()
            .unwrap()
            .push(Shown::Error(message.to_string()));
    }

    fn show_sensors(&mut self, readings: &SensorReadings) {
        self.shown.lock().unwrap().push(Shown::Sensors(*readings));
    }
}

struct BrokenCamera;

#[async_trait]
impl FrameSource for BrokenCamera {
    async fn capture(&mut self) -> Result<DynamicImage, SourceError> {
        Err(SourceError::Empty(PathBuf::from("/dev/video0")))
    }

    fn describe(&self) -> String {
        "broken camera".to_string()
    }
}

fn pipeline(classifier: StubClassifier) -> Arc<ClassifyPipeline> {
    Arc::new(ClassifyPipeline::new(
        Arc::new(classifier),
        PipelineSettings::default(),
    ))
}

fn station_with(
    classifier: StubClassifier,
    source: Box<dyn FrameSource>,
    sensors: MockSensors,
    config: StationConfig,
) -> (Station, RecordingDisplay) {
    let display = RecordingDisplay::default();
    let station = Station::new(
        pipeline(classifier),
        source,
        Box::new(sensors),
        Box::new(display.clone()),
        config,
    );
    (station, display)
}

#[tokio::test]
async fn test_capture_only_below_threshold() {
    let mut sensors = MockSensors::new();
    let mut readings = vec![20u8, 19u8].into_iter();
    sensors
        .expect_proximity()
        .times(2)
        .returning(move || readings.next().unwrap());

    let (mut station, display) = station_with(
        StubClassifier::single("recyclable", 0.8),
        Box::new(SyntheticSource::default()),
        sensors,
        StationConfig::default(),
    );

    assert_eq!(station.check_proximity().await, None);
    assert!(display.shown().is_empty());

    assert_eq!(station.check_proximity().await.as_deref(), Some("recyclable"));
    assert_eq!(
        display.shown(),
        vec![Shown::Result("recyclable".to_string(), ResultTone::Positive)]
    );

    let stats = station.stats();
    assert_eq!(stats.proximity_checks, 2);
    assert_eq!(stats.captures, 1);
    assert_eq!(stats.errors, 0);
}

#[tokio::test]
async fn test_non_recyclable_result_is_negative() {
    let (mut station, display) = station_with(
        StubClassifier::single("hazardous", 0.6),
        Box::new(SyntheticSource::default()),
        MockSensors::new(),
        StationConfig::default(),
    );

    assert_eq!(station.capture_and_classify().await.as_deref(), Some("hazardous"));
    assert_eq!(
        display.shown(),
        vec![Shown::Result("hazardous".to_string(), ResultTone::Negative)]
    );
}

#[tokio::test]
async fn test_empty_frame_is_unknown() {
    let (mut station, display) = station_with(
        StubClassifier::empty(),
        Box::new(SyntheticSource::default()),
        MockSensors::new(),
        StationConfig::default(),
    );

    assert_eq!(station.capture_and_classify().await.as_deref(), Some("Unknown"));
    assert_eq!(
        display.shown(),
        vec![Shown::Result("Unknown".to_string(), ResultTone::Negative)]
    );
}

#[tokio::test]
async fn test_source_failure_shows_error_and_keeps_going() {
    let mut sensors = MockSensors::new();
    sensors.expect_proximity().returning(|| 0);

    let (mut station, display) = station_with(
        StubClassifier::single("recyclable", 0.9),
        Box::new(BrokenCamera),
        sensors,
        StationConfig::default(),
    );

    assert_eq!(station.check_proximity().await, None);
    assert_eq!(station.check_proximity().await, None);

    let shown = display.shown();
    assert_eq!(shown.len(), 2);
    assert!(matches!(&shown[0], Shown::Error(msg) if msg.contains("/dev/video0")));
    assert_eq!(station.stats().errors, 2);
}

#[tokio::test]
async fn test_refresh_sensors_renders_snapshot() {
    let snapshot = SensorReadings {
        temperature: 24,
        humidity: 51,
        proximity: 77,
    };
    let mut sensors = MockSensors::new();
    sensors.expect_read().times(1).return_const(snapshot);

    let (mut station, display) = station_with(
        StubClassifier::empty(),
        Box::new(SyntheticSource::default()),
        sensors,
        StationConfig::default(),
    );

    assert_eq!(station.refresh_sensors(), snapshot);
    assert_eq!(display.shown(), vec![Shown::Sensors(snapshot)]);
    assert_eq!(station.stats().sensor_updates, 1);
}

#[tokio::test]
async fn test_run_stops_on_cancel() {
    let mut sensors = MockSensors::new();
    sensors.expect_read().returning(|| SensorReadings {
        temperature: 22,
        humidity: 45,
        proximity: 90,
    });
    sensors.expect_proximity().returning(|| 90);

    let config = StationConfig {
        proximity_interval: Duration::from_millis(10),
        sensor_interval: Duration::from_millis(5),
        proximity_threshold: 20,
    };
    let (station, display) = station_with(
        StubClassifier::single("recyclable", 0.9),
        Box::new(SyntheticSource::default()),
        sensors,
        config,
    );

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(station.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(60)).await;
    cancel.cancel();

    let stats = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("station did not stop")
        .unwrap();

    assert!(stats.sensor_updates >= 1);
    assert!(stats.proximity_checks >= 1);
    assert_eq!(stats.captures, 0);
    assert!(display
        .shown()
        .iter()
        .all(|shown| matches!(shown, Shown::Sensors(_))));
}

#[tokio::test]
async fn test_run_with_zero_intervals_does_not_panic() {
    let mut sensors = MockSensors::new();
    sensors.expect_read().returning(|| SensorReadings {
        temperature: 20,
        humidity: 40,
        proximity: 90,
    });
    sensors.expect_proximity().returning(|| 90);

    let config = StationConfig {
        proximity_interval: Duration::ZERO,
        sensor_interval: Duration::ZERO,
        proximity_threshold: 20,
    };
    let (station, _display) = station_with(
        StubClassifier::empty(),
        Box::new(SyntheticSource::default()),
        sensors,
        config,
    );

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(station.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    let stats = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("station did not stop")
        .expect("station loop panicked");

    assert!(stats.sensor_updates >= 1);
}
