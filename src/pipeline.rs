// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Capture → classify → explain request cycle
//!
//! Every front-end (HTTP handlers, the capture client's local mode, the
//! station loop) runs images through the same [`ClassifyPipeline`].

use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::classifier::{Classifier, ClassifierError, Detections, LabelError, LabelPolicy};
use crate::instruction::{build_prompt, ChatError, ChatMessage, ChatModel, PromptStyle};
use crate::vision::{decode_image_bytes_with_limit, normalize, ImageError, ImageInfo, MAX_IMAGE_SIZE};

/// Errors surfaced by one pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Upload missing, too large or undecodable
    #[error("{0}")]
    InvalidInput(#[from] ImageError),

    /// The classifier call failed
    #[error("{0}")]
    Classification(#[from] ClassifierError),

    /// Strict validation rejected the label
    #[error("{0}")]
    Validation(#[from] LabelError),

    /// The chat model call failed
    #[error("{0}")]
    Instruction(#[from] ChatError),
}

/// Knobs that differ between deployments
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Square resolution frames are resized to before classification
    pub input_size: u32,
    /// Strict label validation; `None` disables it
    pub label_policy: Option<LabelPolicy>,
    pub prompt_style: PromptStyle,
    pub max_upload_bytes: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            input_size: 640,
            label_policy: None,
            prompt_style: PromptStyle::Instruction,
            max_upload_bytes: MAX_IMAGE_SIZE,
        }
    }
}

/// Which optional stages a run includes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Apply the label policy, when one is configured
    pub validate: bool,
    /// Ask the chat model for an instruction, when one is configured
    pub explain: bool,
    /// Prompt template for this run; `None` uses the configured style
    pub prompt_style: Option<PromptStyle>,
}

impl RunOptions {
    pub fn full() -> Self {
        Self {
            validate: true,
            explain: true,
            prompt_style: None,
        }
    }

    pub fn classify_only() -> Self {
        Self {
            validate: false,
            explain: false,
            prompt_style: None,
        }
    }

    pub fn with_prompt_style(mut self, style: PromptStyle) -> Self {
        self.prompt_style = Some(style);
        self
    }
}

/// Result of one run
#[derive(Debug, Clone)]
pub struct ClassifyOutcome {
    /// Top label, `"Unknown"` when nothing was detected
    pub label: String,
    /// Top confidence (0.0-1.0)
    pub confidence: f32,
    pub detections: Detections,
    /// Chat reply, verbatim
    pub instruction: Option<String>,
    pub image: Option<ImageInfo>,
    pub processing_time_ms: u64,
}

impl ClassifyOutcome {
    /// Confidence as an integer percentage clamped to 0..=100
    pub fn confidence_percent(&self) -> u8 {
        (self.confidence * 100.0).clamp(0.0, 100.0) as u8
    }
}

/// The classify pipeline with its explicitly injected collaborators
pub struct ClassifyPipeline {
    classifier: Arc<dyn Classifier>,
    chat: Option<Arc<dyn ChatModel>>,
    settings: PipelineSettings,
}

impl ClassifyPipeline {
    pub fn new(classifier: Arc<dyn Classifier>, settings: PipelineSettings) -> Self {
        Self {
            classifier,
            chat: None,
            settings,
        }
    }

    pub fn with_chat(mut self, chat: Arc<dyn ChatModel>) -> Self {
        self.chat = Some(chat);
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn chat_model_name(&self) -> Option<&str> {
        self.chat.as_ref().map(|c| c.model_name())
    }

    /// Decode an upload and run it through the pipeline
    pub async fn run_bytes(
        &self,
        bytes: &[u8],
        options: RunOptions,
    ) -> Result<ClassifyOutcome, PipelineError> {
        let (image, info) = decode_image_bytes_with_limit(bytes, self.settings.max_upload_bytes)?;
        debug!(
            "Decoded image: {}x{}, {} bytes",
            info.width, info.height, info.size_bytes
        );

        let mut outcome = self.run(&image, options).await?;
        outcome.image = Some(info);
        Ok(outcome)
    }

    /// Classify only; no validation, no chat call
    pub async fn detect(&self, image: &DynamicImage) -> Result<Detections, PipelineError> {
        let frame = normalize(image, self.settings.input_size);
        Ok(self.classifier.classify(&frame).await?)
    }

    /// Run a decoded image through the enabled stages
    pub async fn run(
        &self,
        image: &DynamicImage,
        options: RunOptions,
    ) -> Result<ClassifyOutcome, PipelineError> {
        let start = Instant::now();

        let detections = self.detect(image).await?;
        let (label, confidence) = detections.top_or_unknown();
        info!(
            "Detected: {} with confidence: {}% ({} candidates, {})",
            label,
            (confidence * 100.0).clamp(0.0, 100.0) as u8,
            detections.len(),
            self.classifier.name()
        );

        if options.validate {
            if let Some(policy) = &self.settings.label_policy {
                if let Err(e) = policy.check(&label) {
                    warn!("Label '{}' rejected: {}", label, e);
                    return Err(e.into());
                }
            }
        }

        let instruction = match (&self.chat, options.explain) {
            (Some(chat), true) => {
                let style = options.prompt_style.unwrap_or(self.settings.prompt_style);
                let prompt = build_prompt(style, &label);
                let reply = chat.chat(&[ChatMessage::user(prompt)]).await?;
                Some(reply)
            }
            _ => None,
        };

        Ok(ClassifyOutcome {
            label,
            confidence,
            detections,
            instruction,
            image: None,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
