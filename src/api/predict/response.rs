// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Predict response types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Top label, `"Unknown"` when nothing was detected
    pub prediction: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
}
