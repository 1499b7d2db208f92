// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Named presets for the four server variants

use serde::{Deserialize, Serialize};

use super::{ChatConfig, ModelBackend, ModelConfig, ResponseShape, ServerConfig};
use crate::classifier::{ModelTask, DEFAULT_ALLOWED_CATEGORIES};
use crate::instruction::PromptStyle;
use crate::vision::MAX_IMAGE_SIZE;

const DETECTION_MODEL: &str = "models/yolov8n.onnx";
const CLASSIFICATION_MODEL: &str = "models/keras_model.onnx";
const CLASSIFICATION_LABELS: &str = "models/labels.txt";

/// Deployment preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Detection + strict labels + plain instruction, any origin
    #[default]
    Flask,
    /// Detection + scored prompt + detailed response for the web front-end
    Webapp,
    /// Detection, raw class indices, no chat model
    Fastapi,
    /// 224px image classifier, label and percentage, no chat model
    Keras,
}

impl std::str::FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flask" => Ok(Profile::Flask),
            "webapp" => Ok(Profile::Webapp),
            "fastapi" => Ok(Profile::Fastapi),
            "keras" => Ok(Profile::Keras),
            other => Err(format!("unknown profile '{}'", other)),
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Profile::Flask => "flask",
            Profile::Webapp => "webapp",
            Profile::Fastapi => "fastapi",
            Profile::Keras => "keras",
        };
        write!(f, "{}", name)
    }
}

impl Profile {
    pub fn port(&self) -> u16 {
        match self {
            Profile::Flask | Profile::Keras => 5000,
            Profile::Webapp => 5001,
            Profile::Fastapi => 8000,
        }
    }

    /// Full server configuration for this preset
    pub fn preset(&self) -> ServerConfig {
        let detection_model = ModelConfig {
            backend: ModelBackend::Onnx,
            model_path: Some(DETECTION_MODEL.into()),
            labels_path: None,
            task: ModelTask::Detect,
            ..ModelConfig::default()
        };

        let base = ServerConfig {
            profile: *self,
            listen_addr: format!("0.0.0.0:{}", self.port()),
            cors_allowed_origins: vec!["*".to_string()],
            input_size: 640,
            strict_validation: false,
            allowed_categories: DEFAULT_ALLOWED_CATEGORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            response_shape: ResponseShape::Instruction,
            prompt_style: PromptStyle::Instruction,
            expose_error_details: true,
            max_upload_bytes: MAX_IMAGE_SIZE,
            model: detection_model,
            chat: ChatConfig::default(),
        };

        match self {
            Profile::Flask => ServerConfig {
                strict_validation: true,
                ..base
            },
            Profile::Webapp => ServerConfig {
                cors_allowed_origins: vec!["http://localhost:5173".to_string()],
                response_shape: ResponseShape::Detailed,
                prompt_style: PromptStyle::Scored,
                ..base
            },
            Profile::Fastapi => ServerConfig {
                response_shape: ResponseShape::Classes,
                chat: ChatConfig {
                    enabled: false,
                    ..ChatConfig::default()
                },
                ..base
            },
            Profile::Keras => ServerConfig {
                input_size: 224,
                response_shape: ResponseShape::Labelled,
                model: ModelConfig {
                    backend: ModelBackend::Onnx,
                    model_path: Some(CLASSIFICATION_MODEL.into()),
                    labels_path: Some(CLASSIFICATION_LABELS.into()),
                    task: ModelTask::Classify,
                    ..ModelConfig::default()
                },
                chat: ChatConfig {
                    enabled: false,
                    ..ChatConfig::default()
                },
                ..base
            },
        }
    }
}
