// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Station result and status rendering

use std::io::{self, Write};

use tracing::warn;

use super::sensors::SensorReadings;

/// Result colour: green for recyclable, red for everything else
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTone {
    Positive,
    Negative,
}

impl ResultTone {
    pub fn for_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("recyclable") {
            ResultTone::Positive
        } else {
            ResultTone::Negative
        }
    }
}

pub trait StationDisplay: Send {
    fn show_result(&mut self, label: &str, tone: ResultTone);

    fn show_error(&mut self, message: &str);

    fn show_sensors(&mut self, readings: &SensorReadings);
}

/// Renders station output as lines on a writer (stdout by default)
pub struct ConsoleDisplay<W: Write + Send = io::Stdout> {
    out: W,
    colored: bool,
}

impl ConsoleDisplay<io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: io::stdout(),
            colored: true,
        }
    }
}

impl<W: Write + Send> ConsoleDisplay<W> {
    /// Plain-text display over any writer
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            colored: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            warn!("Failed to write station output: {}", e);
        }
    }
}

impl<W: Write + Send> StationDisplay for ConsoleDisplay<W> {
    fn show_result(&mut self, label: &str, tone: ResultTone) {
        let text = format!("Classification: {}", label);
        let text = match (self.colored, tone) {
            (true, ResultTone::Positive) => format!("\x1b[97;42m {} \x1b[0m", text),
            (true, ResultTone::Negative) => format!("\x1b[97;41m {} \x1b[0m", text),
            (false, _) => text,
        };
        self.line(&text);
    }

    fn show_error(&mut self, message: &str) {
        let text = format!("Error: {}", message);
        let text = if self.colored {
            format!("\x1b[97;41m {} \x1b[0m", text)
        } else {
            text
        };
        self.line(&text);
    }

    fn show_sensors(&mut self, readings: &SensorReadings) {
        self.line(&format!(
            "Sensor Data: {}",
            readings.to_string().replace('\n', ", ")
        ));
    }
}
