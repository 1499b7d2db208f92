// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX Runtime backend for YOLOv8-style exports
//!
//! Supports the two heads the stock exports ship with:
//! - detection (`yolov8n.pt` → `[1, 4 + nc, anchors]`)
//! - classification (`yolov8n-cls.pt` → `[1, nc]`)
//!
//! Box filtering and non-maximum suppression are part of invoking a
//! detection export; callers only see the ranked result.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::RgbImage;
use ndarray::{Array4, ArrayD, ArrayViewD, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::labels::{load_labels, LabelTable};
use super::types::{BoundingBox, ClassifierError, Detections, Prediction};
use super::Classifier;
use crate::vision::resize_exact;

/// Number of ranked entries kept from a classification head
const CLASSIFY_TOP_K: usize = 5;

/// Which head the exported model carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTask {
    Detect,
    Classify,
}

impl ModelTask {
    /// Input resolution the stock exports were trained at
    pub fn default_input_size(&self) -> u32 {
        match self {
            ModelTask::Detect => 640,
            ModelTask::Classify => 224,
        }
    }
}

impl std::str::FromStr for ModelTask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "detect" | "detection" => Ok(ModelTask::Detect),
            "classify" | "classification" | "cls" => Ok(ModelTask::Classify),
            other => Err(format!("unknown model task '{}'", other)),
        }
    }
}

/// Settings for loading an ONNX classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnnxClassifierConfig {
    pub model_path: PathBuf,
    /// One label per line; COCO-80 is used for detection exports when absent
    #[serde(default)]
    pub labels_path: Option<PathBuf>,
    pub task: ModelTask,
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub intra_threads: usize,
}

impl OnnxClassifierConfig {
    pub fn new(model_path: impl Into<PathBuf>, task: ModelTask) -> Self {
        Self {
            model_path: model_path.into(),
            labels_path: None,
            task,
            input_size: task.default_input_size(),
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 100,
            intra_threads: 4,
        }
    }
}

/// Classifier backed by an ONNX Runtime session
///
/// Runs on CPU. The session needs exclusive access during `run`, so calls are
/// serialized through a mutex and executed on the blocking pool.
pub struct OnnxClassifier {
    session: Arc<Mutex<Session>>,
    input_name: String,
    labels: LabelTable,
    task: ModelTask,
    input_size: u32,
    confidence_threshold: f32,
    iou_threshold: f32,
    max_detections: usize,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("input_name", &self.input_name)
            .field("task", &self.task)
            .field("input_size", &self.input_size)
            .field("labels", &self.labels.len())
            .field("confidence_threshold", &self.confidence_threshold)
            .finish_non_exhaustive()
    }
}

impl OnnxClassifier {
    /// Load the model and its label table
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or labels file not found
    /// - ONNX Runtime initialization fails
    pub fn new(config: OnnxClassifierConfig) -> Result<Self> {
        let model_path: &Path = config.model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("Classification model not found: {}", model_path.display());
        }

        let labels = match (&config.labels_path, config.task) {
            (Some(path), _) => load_labels(path)?,
            (None, ModelTask::Detect) => LabelTable::coco(),
            (None, ModelTask::Classify) => LabelTable::default(),
        };

        info!("Loading classification model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load classification model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        debug!(
            "Classification model loaded - input: {}, task: {:?}, labels: {}",
            input_name,
            config.task,
            labels.len()
        );

        info!("✅ Classification model loaded successfully (CPU-only)");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            labels,
            task: config.task,
            input_size: config.input_size,
            confidence_threshold: config.confidence_threshold.clamp(0.0, 1.0),
            iou_threshold: config.iou_threshold.clamp(0.0, 1.0),
            max_detections: config.max_detections.max(1),
        })
    }

    pub fn task(&self) -> ModelTask {
        self.task
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    fn decode(&self, output: ArrayViewD<f32>) -> Result<Detections, ClassifierError> {
        match self.task {
            ModelTask::Detect => decode_detections(
                output,
                &self.labels,
                self.confidence_threshold,
                self.iou_threshold,
                self.max_detections,
            ),
            ModelTask::Classify => decode_probabilities(output, &self.labels, CLASSIFY_TOP_K),
        }
    }
}

#[async_trait]
impl Classifier for OnnxClassifier {
    async fn classify(&self, image: &RgbImage) -> Result<Detections, ClassifierError> {
        let tensor = to_tensor(image, self.input_size);
        let session = Arc::clone(&self.session);
        let input_name = self.input_name.clone();

        let output = tokio::task::spawn_blocking(move || -> Result<ArrayD<f32>, ClassifierError> {
            let mut session = session
                .lock()
                .map_err(|_| ClassifierError::Inference("session lock poisoned".to_string()))?;

            let input_value = Value::from_array(tensor)
                .map_err(|e| ClassifierError::Inference(format!("input tensor: {}", e)))?;

            let outputs = session
                .run(ort::inputs![&input_name => input_value])
                .map_err(|e| ClassifierError::Inference(e.to_string()))?;

            let view = outputs[0]
                .try_extract_array::<f32>()
                .map_err(|e| ClassifierError::UnexpectedOutput(e.to_string()))?;

            Ok(view.to_owned())
        })
        .await
        .map_err(|e| ClassifierError::Inference(format!("inference task failed: {}", e)))??;

        debug!("Classification output shape: {:?}", output.shape());
        let detections = self.decode(output.view())?;
        debug!("Model returned {} predictions", detections.len());
        Ok(detections)
    }

    fn name(&self) -> &str {
        "onnx"
    }

    fn input_size(&self) -> Option<u32> {
        Some(self.input_size)
    }
}

/// Convert an RGB frame to a `[1, 3, size, size]` tensor scaled to 0..1
pub fn to_tensor(image: &RgbImage, size: u32) -> Array4<f32> {
    let resized = resize_exact(image, size, size);
    let mut tensor = Array4::zeros((1, 3, size as usize, size as usize));

    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    tensor
}

/// Decode a YOLOv8 detection head
///
/// Accepts `[1, 4 + nc, anchors]` as exported, or the transposed
/// `[1, anchors, 4 + nc]` some converters produce. Each anchor contributes its
/// best class when that score clears `confidence_threshold`; overlapping boxes
/// of the same class are then suppressed.
pub fn decode_detections(
    output: ArrayViewD<f32>,
    labels: &LabelTable,
    confidence_threshold: f32,
    iou_threshold: f32,
    max_detections: usize,
) -> Result<Detections, ClassifierError> {
    let shape = output.shape();
    if shape.len() != 3 || shape[0] != 1 {
        return Err(ClassifierError::UnexpectedOutput(format!(
            "expected [1, features, anchors], got {:?}",
            shape
        )));
    }

    let transposed = shape[1] > shape[2];
    let (features, anchors) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };

    if features <= 4 {
        return Err(ClassifierError::UnexpectedOutput(format!(
            "detection output has no class scores: {:?}",
            shape
        )));
    }

    let num_classes = features - 4;
    let at = |feature: usize, anchor: usize| -> f32 {
        if transposed {
            output[IxDyn(&[0, anchor, feature])]
        } else {
            output[IxDyn(&[0, feature, anchor])]
        }
    };

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let mut best_class = 0usize;
        let mut best_score = f32::MIN;
        for class in 0..num_classes {
            let score = at(4 + class, anchor);
            if score > best_score {
                best_score = score;
                best_class = class;
            }
        }

        if best_score < confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (at(0, anchor), at(1, anchor), at(2, anchor), at(3, anchor));
        let bbox = BoundingBox {
            x_min: cx - w / 2.0,
            y_min: cy - h / 2.0,
            x_max: cx + w / 2.0,
            y_max: cy + h / 2.0,
        };

        let class_id = best_class as u32;
        candidates.push(Prediction::new(class_id, labels.name(class_id), best_score).with_bbox(bbox));
    }

    let ranked = Detections::ranked(candidates);
    let mut kept: Vec<Prediction> = Vec::new();
    for candidate in ranked.predictions() {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id
                && match (k.bbox, candidate.bbox) {
                    (Some(a), Some(b)) => a.iou(&b) > iou_threshold,
                    _ => false,
                }
        });
        if !suppressed {
            kept.push(candidate.clone());
        }
    }

    Ok(Detections::ranked(kept))
}

/// Decode a classification head into its `top_k` classes
///
/// Raw logits are passed through softmax; outputs that are already a
/// probability distribution are used as-is.
pub fn decode_probabilities(
    output: ArrayViewD<f32>,
    labels: &LabelTable,
    top_k: usize,
) -> Result<Detections, ClassifierError> {
    let shape = output.shape();
    let valid = match shape.len() {
        1 => true,
        2 => shape[0] == 1,
        _ => false,
    };
    if !valid || output.is_empty() {
        return Err(ClassifierError::UnexpectedOutput(format!(
            "expected [1, classes], got {:?}",
            shape
        )));
    }

    let mut scores: Vec<f32> = output.iter().copied().collect();
    let sum: f32 = scores.iter().sum();
    let normalized = scores.iter().all(|s| (0.0..=1.0).contains(s)) && (sum - 1.0).abs() < 1e-3;
    if !normalized {
        softmax(&mut scores);
    }

    let predictions = scores
        .iter()
        .enumerate()
        .map(|(idx, score)| Prediction::new(idx as u32, labels.name(idx as u32), *score))
        .collect();

    let ranked = Detections::ranked(predictions);
    Ok(Detections::ranked(
        ranked.predictions().iter().take(top_k).cloned().collect(),
    ))
}

fn softmax(values: &mut [f32]) {
    let max = values.iter().cloned().fold(f32::MIN, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
}
