// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Predict endpoint handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{debug, info, warn};

use super::request::PredictRequest;
use super::response::PredictResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::pipeline::{PipelineError, RunOptions};
use crate::vision::decode_base64_image_with_limit;

/// POST /predict - classify a base64 image sent as JSON
///
/// # Request
/// - `image`: base64 image data or a data URL (required)
///
/// # Response
/// - `prediction`: top label
/// - `confidence`: top confidence (0.0-1.0)
///
/// # Errors
/// - 400 Bad Request: missing or undecodable image
/// - 500 Internal Server Error: classifier failure
pub async fn predict_handler(
    State(state): State<AppState>,
    request: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(request) = request.map_err(|e| {
        warn!("Rejected predict request: {}", e);
        ApiError::InvalidRequest("No image data provided".to_string())
    })?;

    let image_data = request.image_data()?;
    let (image, image_info) =
        decode_base64_image_with_limit(image_data, state.config.max_upload_bytes).map_err(|e| {
            warn!("Failed to decode image: {}", e);
            ApiError::from_pipeline(PipelineError::InvalidInput(e), state.config.expose_error_details)
        })?;

    debug!(
        "Decoded image: {}x{}, {} bytes",
        image_info.width, image_info.height, image_info.size_bytes
    );

    let outcome = state
        .pipeline
        .run(&image, RunOptions::classify_only())
        .await
        .map_err(|e| ApiError::from_pipeline(e, state.config.expose_error_details))?;

    info!(
        "Predict complete: {} ({:.2}), {}ms",
        outcome.label, outcome.confidence, outcome.processing_time_ms
    );

    Ok(Json(PredictResponse {
        prediction: outcome.label,
        confidence: outcome.confidence,
    }))
}
