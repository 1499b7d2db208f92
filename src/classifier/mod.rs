// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classification backends
//!
//! Every backend answers the same question: given a normalised RGB frame,
//! which categories does the model see, ranked by confidence. The pipeline
//! only ever consults the first entry.

pub mod labels;
pub mod onnx;
pub mod policy;
pub mod remote;
pub mod stub;
pub mod types;

use async_trait::async_trait;
use image::RgbImage;

pub use labels::{load_labels, LabelTable, COCO_LABELS};
pub use onnx::{ModelTask, OnnxClassifier, OnnxClassifierConfig};
pub use policy::{LabelError, LabelPolicy, DEFAULT_ALLOWED_CATEGORIES, MAX_LABEL_LEN};
pub use remote::RemoteClassifier;
pub use stub::StubClassifier;
pub use types::{BoundingBox, ClassifierError, Detections, Prediction, UNKNOWN_LABEL};

/// Trait implemented by every classification backend
///
/// Implementations are constructed once at startup and shared across
/// requests behind an `Arc`.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Run the model on a frame already normalised to [`Classifier::input_size`]
    async fn classify(&self, image: &RgbImage) -> Result<Detections, ClassifierError>;

    /// Backend name for logging and health output
    fn name(&self) -> &str;

    /// Square input resolution the backend expects, if it has a preference
    fn input_size(&self) -> Option<u32> {
        None
    }
}
