// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze endpoint handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{debug, info, warn};

use super::request::AnalyzeRequest;
use crate::api::classify::DetailedResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::instruction::PromptStyle;
use crate::pipeline::{PipelineError, RunOptions};
use crate::vision::decode_base64_image_with_limit;

/// POST /api/classify - component breakdown for the web front-end
///
/// # Request
/// - `imageData`: data URL or plain base64 (required)
///
/// # Response
/// `{success, objectName, classification, components, confidence}`. The chat
/// model is asked for the structured line format whatever prompt style is
/// configured; without a chat model the top label becomes the only component.
///
/// # Errors
/// - 400 Bad Request: missing or undecodable image
/// - 500 Internal Server Error: classifier or chat model failure
pub async fn analyze_handler(
    State(state): State<AppState>,
    request: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<DetailedResponse>, ApiError> {
    let Json(request) = request.map_err(|e| {
        warn!("Rejected analyze request: {}", e);
        ApiError::InvalidRequest("No image data provided".to_string())
    })?;

    let (image, image_info) =
        decode_base64_image_with_limit(request.image_data()?, state.config.max_upload_bytes)
            .map_err(|e| {
                warn!("Failed to decode image: {}", e);
                ApiError::from_pipeline(
                    PipelineError::InvalidInput(e),
                    state.config.expose_error_details,
                )
            })?;

    debug!(
        "Decoded image: {}x{}, {} bytes",
        image_info.width, image_info.height, image_info.size_bytes
    );

    let options = RunOptions {
        validate: false,
        ..RunOptions::full()
    }
    .with_prompt_style(PromptStyle::Structured);

    let outcome = state
        .pipeline
        .run(&image, options)
        .await
        .map_err(|e| ApiError::from_pipeline(e, state.config.expose_error_details))?;

    info!(
        "Analyze complete: label={}, {}ms",
        outcome.label, outcome.processing_time_ms
    );

    Ok(Json(DetailedResponse::from(outcome)))
}
