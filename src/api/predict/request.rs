// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Predict request types and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;

/// Request for a single prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Base64 image data, optionally as a `data:image/...;base64,` URL
    #[serde(default)]
    pub image: Option<String>,
}

impl PredictRequest {
    /// Return the image payload, rejecting missing or blank values
    pub fn image_data(&self) -> Result<&str, ApiError> {
        match self.image.as_deref().map(str::trim) {
            Some(image) if !image.is_empty() => Ok(image),
            _ => Err(ApiError::InvalidRequest("No image data provided".to_string())),
        }
    }
}
