// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt templates

use serde::{Deserialize, Serialize};

/// How the label is turned into a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    /// Plain disposal instruction
    Instruction,
    /// Instruction plus category and a free-text confidence level
    Scored,
    /// Line-oriented `Object:/Components:/Categories:/Reasons:/Confidence:` reply
    Structured,
}

impl std::str::FromStr for PromptStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "instruction" => Ok(PromptStyle::Instruction),
            "scored" => Ok(PromptStyle::Scored),
            "structured" => Ok(PromptStyle::Structured),
            other => Err(format!("unknown prompt style '{}'", other)),
        }
    }
}

const STRUCTURED_TEMPLATE: &str = "A camera classified a waste item as '{label}'.
1. Identify the specific waste object and its materials
2. Identify if the object has multiple components (e.g., plastic bottle with metal cap)
3. For each component, classify it into exactly one of these categories:
   - Recyclable Waste (e.g., paper, glass bottles, plastic bottles, aluminum cans, cardboard boxes, metal items)
   - Hazardous Waste (e.g., batteries, paint, pesticides, medical waste, sharp objects)
   - Solid Waste (e.g., broken toys, used tissue, plastic wrappers, old shoes, styrofoam)
   - Organic Waste (e.g., fruit peels, vegetable scraps, leaves, food leftovers)
4. Explain briefly how each component should be disposed of
5. Estimate classification confidence (0-100%)

Format the response exactly as:
Object: [detailed object name]
Components: [list of components, separated by semicolons]
Categories: [category for each component, in same order, separated by semicolons]
Reasons: [disposal instruction for each component, in same order, separated by semicolons]
Confidence: [number]";

/// Render the prompt for a label
pub fn build_prompt(style: PromptStyle, label: &str) -> String {
    match style {
        PromptStyle::Instruction => format!("Give a waste disposal instruction for '{}'", label),
        PromptStyle::Scored => format!(
            "Give a waste disposal instruction and category for '{}'. Also say confidence level (0-100%)",
            label
        ),
        PromptStyle::Structured => STRUCTURED_TEMPLATE.replace("{label}", label),
    }
}
