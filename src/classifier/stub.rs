// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fixed-output classifier for tests and dry runs

use async_trait::async_trait;
use image::RgbImage;

use super::types::{ClassifierError, Detections, Prediction};
use super::Classifier;

/// Classifier that returns the same predictions for every frame
#[derive(Debug, Clone, Default)]
pub struct StubClassifier {
    predictions: Vec<Prediction>,
    input_size: Option<u32>,
}

impl StubClassifier {
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self {
            predictions,
            input_size: None,
        }
    }

    /// A stub that always sees exactly one object
    pub fn single(label: &str, confidence: f32) -> Self {
        Self::new(vec![Prediction::new(0, label, confidence)])
    }

    /// A stub that never sees anything
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = Some(size);
        self
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(&self, _image: &RgbImage) -> Result<Detections, ClassifierError> {
        Ok(Detections::ranked(self.predictions.clone()))
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn input_size(&self) -> Option<u32> {
        self.input_size
    }
}
