// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types for classifier backends

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label reported when the model returns no predictions
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Axis-aligned box in model input pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        (self.x_max - self.x_min).max(0.0) * (self.y_max - self.y_min).max(0.0)
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix = (self.x_max.min(other.x_max) - self.x_min.max(other.x_min)).max(0.0);
        let iy = (self.y_max.min(other.y_max) - self.y_min.max(other.y_min)).max(0.0);
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// A single ranked prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Class index in the model's label table
    pub class_id: u32,
    /// Human-readable class name
    pub label: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// Location for detection models
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl Prediction {
    pub fn new(class_id: u32, label: impl Into<String>, confidence: f32) -> Self {
        Self {
            class_id,
            label: label.into(),
            confidence,
            bbox: None,
        }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

/// Ranked output of one classifier call, highest confidence first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detections {
    predictions: Vec<Prediction>,
}

impl Detections {
    /// Build from predictions in any order; they are ranked by confidence
    pub fn ranked(mut predictions: Vec<Prediction>) -> Self {
        predictions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self { predictions }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    /// First-ranked prediction, if any
    pub fn top(&self) -> Option<&Prediction> {
        self.predictions.first()
    }

    /// Label and confidence of the top prediction, `("Unknown", 0.0)` when empty
    pub fn top_or_unknown(&self) -> (String, f32) {
        match self.top() {
            Some(p) => (p.label.clone(), p.confidence),
            None => (UNKNOWN_LABEL.to_string(), 0.0),
        }
    }

    /// Class indices in ranked order
    pub fn class_ids(&self) -> Vec<u32> {
        self.predictions.iter().map(|p| p.class_id).collect()
    }
}

/// Errors that can occur while invoking a classifier
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The model could not be loaded
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    /// The model call itself failed
    #[error("Inference failed: {0}")]
    Inference(String),

    /// The model output did not have the expected layout
    #[error("Unexpected model output: {0}")]
    UnexpectedOutput(String),

    /// A remote classifier could not be reached
    #[error("Remote classifier request failed: {0}")]
    Transport(String),

    /// A remote classifier answered with an error status
    #[error("Remote classifier returned {status}: {message}")]
    RemoteStatus { status: u16, message: String },
}
