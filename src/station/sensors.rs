// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Station sensor readings

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReadings {
    /// Degrees Celsius
    pub temperature: i32,
    /// Relative humidity, percent
    pub humidity: i32,
    /// Distance reading 0..100; low means an item is close
    pub proximity: u8,
}

impl fmt::Display for SensorReadings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temperature: {}\nHumidity: {}\nProximity: {}",
            self.temperature, self.humidity, self.proximity
        )
    }
}

/// Source of sensor values for the station loop
pub trait SensorReader: Send {
    /// Full sensor snapshot for the status panel
    fn read(&mut self) -> SensorReadings;

    /// Proximity value used to trigger a capture
    fn proximity(&mut self) -> u8;
}

/// Random readings in the ranges real station hardware reports
pub struct SimulatedSensors {
    rng: StdRng,
}

impl SimulatedSensors {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible readings
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SimulatedSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorReader for SimulatedSensors {
    fn read(&mut self) -> SensorReadings {
        SensorReadings {
            temperature: self.rng.gen_range(20..30),
            humidity: self.rng.gen_range(40..60),
            proximity: self.proximity(),
        }
    }

    fn proximity(&mut self) -> u8 {
        self.rng.gen_range(0..100)
    }
}
