// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::pipeline::PipelineError;

/// Body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    InvalidRequest(String),
    ValidationError { field: String, message: String },
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, message) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone()),
            ApiError::ValidationError { message, .. } => ("validation_error", message.clone()),
            ApiError::InternalError(msg) => ("internal_error", msg.clone()),
        };

        ErrorResponse {
            error: message,
            error_type: error_type.to_string(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) | ApiError::ValidationError { .. } => 400,
            ApiError::InternalError(_) => 500,
        }
    }

    /// Map a pipeline failure, hiding downstream messages unless `expose_details`
    pub fn from_pipeline(err: PipelineError, expose_details: bool) -> Self {
        match err {
            PipelineError::InvalidInput(e) => ApiError::InvalidRequest(e.to_string()),
            PipelineError::Validation(e) => ApiError::ValidationError {
                field: "label".to_string(),
                message: e.to_string(),
            },
            PipelineError::Classification(e) => {
                warn!("Classification failed: {}", e);
                ApiError::InternalError(downstream_message("Classification failed", &e, expose_details))
            }
            PipelineError::Instruction(e) => {
                warn!("Instruction generation failed: {}", e);
                ApiError::InternalError(downstream_message(
                    "Instruction generation failed",
                    &e,
                    expose_details,
                ))
            }
        }
    }
}

fn downstream_message(context: &str, err: &dyn fmt::Display, expose_details: bool) -> String {
    if expose_details {
        format!("{}: {}", context, err)
    } else {
        context.to_string()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}
