// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server configuration
//!
//! One [`ServerConfig`] drives every server variant. A [`Profile`] supplies
//! the defaults, `SORTYX_*` environment variables or a TOML file override them.

pub mod profile;

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub use profile::Profile;

use crate::classifier::{
    Classifier, LabelPolicy, ModelTask, OnnxClassifier, OnnxClassifierConfig, RemoteClassifier,
    StubClassifier,
};
use crate::instruction::{ChatClient, ChatModel, PromptStyle, DEFAULT_CHAT_MODEL};
use crate::pipeline::{ClassifyPipeline, PipelineSettings, RunOptions};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// JSON shape returned by `POST /classify`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    /// `{label, instruction}`
    Instruction,
    /// `{label, confidence}` with an integer percentage
    Labelled,
    /// `{success, objectName, classification, components, confidence}`
    Detailed,
    /// `{classes: [...]}`
    Classes,
}

impl FromStr for ResponseShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "instruction" => Ok(ResponseShape::Instruction),
            "labelled" | "labeled" => Ok(ResponseShape::Labelled),
            "detailed" => Ok(ResponseShape::Detailed),
            "classes" => Ok(ResponseShape::Classes),
            other => Err(format!("unknown response shape '{}'", other)),
        }
    }
}

impl ResponseShape {
    /// Pipeline stages this shape needs
    pub fn run_options(&self) -> RunOptions {
        match self {
            ResponseShape::Instruction | ResponseShape::Detailed => RunOptions::full(),
            ResponseShape::Labelled | ResponseShape::Classes => RunOptions {
                validate: true,
                ..RunOptions::classify_only()
            },
        }
    }
}

/// Where classification runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// Local ONNX Runtime session
    Onnx,
    /// Another classify server
    Remote,
    /// Fixed output, no model
    Stub,
}

impl FromStr for ModelBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "onnx" => Ok(ModelBackend::Onnx),
            "remote" => Ok(ModelBackend::Remote),
            "stub" => Ok(ModelBackend::Stub),
            other => Err(format!("unknown model backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub backend: ModelBackend,
    pub model_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub task: ModelTask,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    /// Endpoint for the remote backend
    pub remote_url: Option<String>,
    pub remote_timeout_secs: u64,
    /// Label the stub backend reports; `None` means it never detects anything
    pub stub_label: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: ModelBackend::Onnx,
            model_path: None,
            labels_path: None,
            task: ModelTask::Detect,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            remote_url: None,
            remote_timeout_secs: 30,
            stub_label: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible server (Ollama by default)
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:11434".to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub profile: Profile,
    pub listen_addr: String,
    /// `"*"` allows any origin
    pub cors_allowed_origins: Vec<String>,
    /// Square resolution frames are resized to
    pub input_size: u32,
    pub strict_validation: bool,
    pub allowed_categories: Vec<String>,
    pub response_shape: ResponseShape,
    pub prompt_style: PromptStyle,
    /// Include downstream error messages in 500 responses
    pub expose_error_details: bool,
    pub max_upload_bytes: usize,
    pub model: ModelConfig,
    pub chat: ChatConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Profile::default().preset()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from a TOML file
    ///
    /// Keys left out of the file fall back to the default (flask) preset,
    /// or to the preset named by a top-level `profile` key.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content)?;
        let profile = match table.get("profile").and_then(|v| v.as_str()) {
            Some(name) => parse_value::<Profile>("profile", name)?,
            None => Profile::default(),
        };

        // Overlay the file onto the chosen preset
        let preset = match toml::Value::try_from(profile.preset()) {
            Ok(toml::Value::Table(preset)) => preset,
            Ok(_) => return Err(ConfigError::Invalid("preset is not a table".to_string())),
            Err(e) => return Err(ConfigError::Invalid(e.to_string())),
        };
        let merged = merge_tables(preset, table);
        let config: ServerConfig = toml::Value::Table(merged).try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let profile = match var("SORTYX_PROFILE") {
            Some(name) => parse_value::<Profile>("SORTYX_PROFILE", &name)?,
            None => Profile::default(),
        };
        let mut config = profile.preset();

        if let Some(addr) = var("SORTYX_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(port) = var("SORTYX_PORT") {
            let port = parse_value::<u16>("SORTYX_PORT", &port)?;
            let host = config
                .listen_addr
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            config.listen_addr = format!("{}:{}", host, port);
        }
        if let Some(origins) = var("SORTYX_CORS_ORIGINS") {
            config.cors_allowed_origins = split_list(&origins);
        }
        if let Some(size) = var("SORTYX_INPUT_SIZE") {
            config.input_size = parse_value("SORTYX_INPUT_SIZE", &size)?;
        }
        if let Some(strict) = var("SORTYX_STRICT") {
            config.strict_validation = parse_bool("SORTYX_STRICT", &strict)?;
        }
        if let Some(categories) = var("SORTYX_ALLOWED_CATEGORIES") {
            config.allowed_categories = split_list(&categories);
        }
        if let Some(shape) = var("SORTYX_RESPONSE_SHAPE") {
            config.response_shape = parse_value("SORTYX_RESPONSE_SHAPE", &shape)?;
        }
        if let Some(style) = var("SORTYX_PROMPT_STYLE") {
            config.prompt_style = parse_value("SORTYX_PROMPT_STYLE", &style)?;
        }
        if let Some(expose) = var("SORTYX_EXPOSE_ERRORS") {
            config.expose_error_details = parse_bool("SORTYX_EXPOSE_ERRORS", &expose)?;
        }
        if let Some(max) = var("SORTYX_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = parse_value("SORTYX_MAX_UPLOAD_BYTES", &max)?;
        }

        if let Some(backend) = var("SORTYX_MODEL_BACKEND") {
            config.model.backend = parse_value("SORTYX_MODEL_BACKEND", &backend)?;
        }
        if let Some(path) = var("SORTYX_MODEL_PATH") {
            config.model.model_path = Some(PathBuf::from(path));
        }
        if let Some(path) = var("SORTYX_LABELS_PATH") {
            config.model.labels_path = Some(PathBuf::from(path));
        }
        if let Some(task) = var("SORTYX_MODEL_TASK") {
            config.model.task = parse_value("SORTYX_MODEL_TASK", &task)?;
        }
        if let Some(threshold) = var("SORTYX_CONFIDENCE_THRESHOLD") {
            config.model.confidence_threshold =
                parse_value("SORTYX_CONFIDENCE_THRESHOLD", &threshold)?;
        }
        if let Some(threshold) = var("SORTYX_IOU_THRESHOLD") {
            config.model.iou_threshold = parse_value("SORTYX_IOU_THRESHOLD", &threshold)?;
        }
        if let Some(url) = var("SORTYX_REMOTE_URL") {
            config.model.remote_url = Some(url);
        }
        if let Some(label) = var("SORTYX_STUB_LABEL") {
            config.model.stub_label = Some(label);
        }

        if let Some(enabled) = var("SORTYX_CHAT_ENABLED") {
            config.chat.enabled = parse_bool("SORTYX_CHAT_ENABLED", &enabled)?;
        }
        if let Some(endpoint) = var("SORTYX_CHAT_ENDPOINT") {
            config.chat.endpoint = endpoint;
        }
        if let Some(model) = var("SORTYX_CHAT_MODEL") {
            config.chat.model = model;
        }
        if let Some(timeout) = var("SORTYX_CHAT_TIMEOUT_SECS") {
            config.chat.timeout_secs = parse_value("SORTYX_CHAT_TIMEOUT_SECS", &timeout)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.input_size == 0 {
            return Err(ConfigError::Invalid(
                "input_size must be greater than 0".to_string(),
            ));
        }
        if self.cors_allowed_origins.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one CORS origin is required (use \"*\" for any)".to_string(),
            ));
        }
        if self.strict_validation && self.allowed_categories.is_empty() {
            return Err(ConfigError::Invalid(
                "strict validation needs at least one allowed category".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        match self.model.backend {
            ModelBackend::Onnx if self.model.model_path.is_none() => {
                return Err(ConfigError::Invalid(
                    "onnx backend requires model_path".to_string(),
                ));
            }
            ModelBackend::Remote if self.model.remote_url.is_none() => {
                return Err(ConfigError::Invalid(
                    "remote backend requires remote_url".to_string(),
                ));
            }
            _ => {}
        }
        if self.chat.enabled && self.chat.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "chat timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "listen_addr".to_string(),
                value: self.listen_addr.clone(),
            })
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_allowed_origins.iter().any(|o| o == "*")
    }

    pub fn label_policy(&self) -> Option<LabelPolicy> {
        self.strict_validation
            .then(|| LabelPolicy::with_allowed(&self.allowed_categories))
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            input_size: self.input_size,
            label_policy: self.label_policy(),
            prompt_style: self.prompt_style,
            max_upload_bytes: self.max_upload_bytes,
        }
    }

    /// Construct the configured classifier backend
    pub fn build_classifier(&self) -> anyhow::Result<Arc<dyn Classifier>> {
        let classifier: Arc<dyn Classifier> = match self.model.backend {
            ModelBackend::Onnx => {
                let model_path = self
                    .model
                    .model_path
                    .clone()
                    .context("onnx backend requires model_path")?;
                let mut onnx = OnnxClassifierConfig::new(model_path, self.model.task);
                onnx.labels_path = self.model.labels_path.clone();
                onnx.input_size = self.input_size;
                onnx.confidence_threshold = self.model.confidence_threshold;
                onnx.iou_threshold = self.model.iou_threshold;
                Arc::new(OnnxClassifier::new(onnx)?)
            }
            ModelBackend::Remote => {
                let url = self
                    .model
                    .remote_url
                    .as_deref()
                    .context("remote backend requires remote_url")?;
                let remote = RemoteClassifier::new(
                    url,
                    Duration::from_secs(self.model.remote_timeout_secs),
                )?
                .with_input_size(self.input_size);
                Arc::new(remote)
            }
            ModelBackend::Stub => {
                let stub = match &self.model.stub_label {
                    Some(label) => StubClassifier::single(label, 1.0),
                    None => StubClassifier::empty(),
                };
                Arc::new(stub.with_input_size(self.input_size))
            }
        };

        info!(
            "Classifier ready: backend={}, input_size={}",
            classifier.name(),
            self.input_size
        );
        Ok(classifier)
    }

    /// Construct the chat model, if enabled
    pub fn build_chat_model(&self) -> anyhow::Result<Option<Arc<dyn ChatModel>>> {
        if !self.chat.enabled {
            info!("Chat model disabled");
            return Ok(None);
        }

        let client = ChatClient::new(
            &self.chat.endpoint,
            &self.chat.model,
            Duration::from_secs(self.chat.timeout_secs),
        )?;
        Ok(Some(Arc::new(client)))
    }

    /// Wire the classifier and chat model into a pipeline
    pub fn build_pipeline(&self) -> anyhow::Result<ClassifyPipeline> {
        let pipeline = ClassifyPipeline::new(self.build_classifier()?, self.pipeline_settings());
        Ok(match self.build_chat_model()? {
            Some(chat) => pipeline.with_chat(chat),
            None => pipeline,
        })
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn merge_tables(mut base: toml::Table, overlay: toml::Table) -> toml::Table {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                let merged = merge_tables(std::mem::take(existing), nested);
                *existing = merged;
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
    base
}
