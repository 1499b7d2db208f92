// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classify endpoint handlers

use axum::extract::State;
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use bytes::Bytes;
use tracing::{debug, info, warn};

use super::response::ClassifyResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::config::ResponseShape;
use crate::pipeline::RunOptions;

/// Multipart field carrying the upload
pub const IMAGE_FIELD: &str = "image";

/// Fields accepted by `POST /classify/`; FastAPI clients upload `file`
pub const CLASSES_FIELDS: &[&str] = &["file", IMAGE_FIELD];

/// POST /classify - classify an uploaded image
///
/// Accepts `multipart/form-data` with an `image` file field. The response
/// shape is chosen by configuration.
///
/// # Errors
/// - 400 Bad Request: no `image` field, not multipart, undecodable image,
///   or a label rejected by strict validation
/// - 500 Internal Server Error: classifier or chat model failure
pub async fn classify_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ClassifyResponse, ApiError> {
    let shape = state.config.response_shape;
    let bytes = read_image_field(multipart, &[IMAGE_FIELD]).await?;

    let options = shape.run_options();

    let outcome = state
        .pipeline
        .run_bytes(&bytes, options)
        .await
        .map_err(|e| ApiError::from_pipeline(e, state.config.expose_error_details))?;

    info!(
        "Classify complete: label={}, confidence={}%, {}ms",
        outcome.label,
        outcome.confidence_percent(),
        outcome.processing_time_ms
    );

    Ok(ClassifyResponse::from_outcome(shape, outcome))
}

/// POST /classify/ - raw class indices, whatever the configured shape
pub async fn classes_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ClassifyResponse, ApiError> {
    let bytes = read_image_field(multipart, CLASSES_FIELDS).await?;

    let outcome = state
        .pipeline
        .run_bytes(&bytes, RunOptions::classify_only())
        .await
        .map_err(|e| ApiError::from_pipeline(e, state.config.expose_error_details))?;

    Ok(ClassifyResponse::from_outcome(ResponseShape::Classes, outcome))
}

/// Pull the bytes of the first field named in `accepted` out of a multipart body
pub async fn read_image_field(
    multipart: Result<Multipart, MultipartRejection>,
    accepted: &[&str],
) -> Result<Bytes, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Rejected classify request: {}", e);
        ApiError::InvalidRequest("No image uploaded".to_string())
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Malformed upload: {}", e)))?
    {
        if !field.name().is_some_and(|name| accepted.contains(&name)) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Malformed upload: {}", e)))?;
        if bytes.is_empty() {
            return Err(ApiError::InvalidRequest("No image uploaded".to_string()));
        }
        debug!("Received image upload: {} bytes", bytes.len());
        return Ok(bytes);
    }

    Err(ApiError::InvalidRequest("No image uploaded".to_string()))
}
