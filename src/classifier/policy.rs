// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Strict label validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categories accepted when strict validation is on
pub const DEFAULT_ALLOWED_CATEGORIES: &[&str] = &["plastic", "paper", "metal", "glass", "organic"];

/// Longest label accepted
pub const MAX_LABEL_LEN: usize = 50;

/// Reasons a label is rejected; the messages are returned to clients as-is
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("No label detected")]
    Empty,

    #[error("Label too long")]
    TooLong,

    #[error("Label contains invalid characters")]
    InvalidCharacters,

    #[error("Unknown category")]
    UnknownCategory,
}

/// Allow-list check applied to the top label before it reaches the chat model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPolicy {
    /// Lower-case category names
    pub allowed: Vec<String>,
    pub max_len: usize,
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_ALLOWED_CATEGORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_len: MAX_LABEL_LEN,
        }
    }
}

impl LabelPolicy {
    pub fn with_allowed<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: allowed
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            max_len: MAX_LABEL_LEN,
        }
    }

    /// Checks run in order and the first failure wins
    pub fn check(&self, label: &str) -> Result<(), LabelError> {
        if label.is_empty() {
            return Err(LabelError::Empty);
        }
        if label.chars().count() > self.max_len {
            return Err(LabelError::TooLong);
        }
        if !label
            .chars()
            .all(|c| c.is_alphanumeric() || c.is_whitespace())
        {
            return Err(LabelError::InvalidCharacters);
        }
        let lowered = label.to_lowercase();
        if !self.allowed.iter().any(|a| *a == lowered) {
            return Err(LabelError::UnknownCategory);
        }
        Ok(())
    }
}
