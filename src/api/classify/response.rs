// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classify response shapes

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::catalog::{generated_category, match_category, unclassified, WasteCategory};
use crate::config::ResponseShape;
use crate::instruction::{extract_confidence, parse_structured_reply};
use crate::pipeline::ClassifyOutcome;

/// `{label, instruction}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionResponse {
    pub label: String,
    pub instruction: Option<String>,
}

/// `{label, confidence}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelledResponse {
    pub label: String,
    /// Integer percentage (0-100)
    pub confidence: u8,
}

/// One component of a detailed response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentView {
    pub name: String,
    pub classification: WasteCategory,
    pub reason: String,
}

/// Response consumed by the web front-end
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedResponse {
    pub success: bool,
    pub object_name: String,
    pub classification: WasteCategory,
    pub components: Vec<ComponentView>,
    /// Integer percentage (0-100)
    pub confidence: u8,
}

/// `{classes: [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassesResponse {
    pub classes: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassifyResponse {
    Instruction(InstructionResponse),
    Labelled(LabelledResponse),
    Detailed(DetailedResponse),
    Classes(ClassesResponse),
}

impl ClassifyResponse {
    pub fn from_outcome(shape: ResponseShape, outcome: ClassifyOutcome) -> Self {
        match shape {
            ResponseShape::Instruction => ClassifyResponse::Instruction(InstructionResponse {
                label: outcome.label,
                instruction: outcome.instruction,
            }),
            ResponseShape::Labelled => ClassifyResponse::Labelled(LabelledResponse {
                confidence: outcome.confidence_percent(),
                label: outcome.label,
            }),
            ResponseShape::Detailed => ClassifyResponse::Detailed(DetailedResponse::from(outcome)),
            ResponseShape::Classes => ClassifyResponse::Classes(ClassesResponse {
                classes: outcome.detections.class_ids(),
            }),
        }
    }
}

impl IntoResponse for ClassifyResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Catalog entry without its example list
fn summary(category: WasteCategory) -> WasteCategory {
    WasteCategory {
        examples: Vec::new(),
        ..category
    }
}

impl From<ClassifyOutcome> for DetailedResponse {
    fn from(outcome: ClassifyOutcome) -> Self {
        let structured = outcome.instruction.as_deref().and_then(parse_structured_reply);

        if let Some(parsed) = structured {
            let components: Vec<ComponentView> = parsed
                .components
                .into_iter()
                .map(|c| ComponentView {
                    classification: summary(match_category(&c.category)),
                    name: c.name,
                    reason: c.reason,
                })
                .collect();
            let classification = components
                .first()
                .map(|c| c.classification.clone())
                .unwrap_or_else(unclassified);

            return DetailedResponse {
                success: true,
                object_name: parsed.object,
                classification,
                components,
                confidence: parsed.confidence,
            };
        }

        // Free-text reply: one component named after the raw label
        let category = generated_category(&outcome.label);
        let confidence = match outcome.instruction.as_deref() {
            Some(reply) => extract_confidence(reply),
            None => outcome.confidence_percent(),
        };

        DetailedResponse {
            success: true,
            object_name: outcome.label.clone(),
            classification: category.clone(),
            components: vec![ComponentView {
                name: outcome.label,
                classification: category,
                reason: outcome.instruction.unwrap_or_default(),
            }],
            confidence,
        }
    }
}
