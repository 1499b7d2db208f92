// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod capture;
pub mod catalog;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod instruction;
pub mod pipeline;
pub mod station;
pub mod version;
pub mod vision;

// Re-export main types
pub use classifier::{Classifier, ClassifierError, Detections, Prediction, UNKNOWN_LABEL};
pub use config::{Profile, ResponseShape, ServerConfig};
pub use instruction::{ChatError, ChatModel, PromptStyle};
pub use pipeline::{ClassifyOutcome, ClassifyPipeline, PipelineError, PipelineSettings, RunOptions};
