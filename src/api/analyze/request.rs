// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze request types

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;

/// Body posted by the web front-end
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Data URL or plain base64
    #[serde(default)]
    pub image_data: Option<String>,
}

impl AnalyzeRequest {
    pub fn image_data(&self) -> Result<&str, ApiError> {
        match self.image_data.as_deref().map(str::trim) {
            Some(image) if !image.is_empty() => Ok(image),
            _ => Err(ApiError::InvalidRequest("No image data provided".to_string())),
        }
    }
}
