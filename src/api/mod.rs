// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod analyze;
pub mod classify;
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod predict;

pub use analyze::{analyze_handler, AnalyzeRequest};
pub use classify::{classes_handler, classify_handler, ClassifyResponse};
pub use errors::{ApiError, ErrorResponse};
pub use handlers::{CategoriesResponse, HealthResponse};
pub use http_server::{create_app, start_server, AppState};
pub use predict::{predict_handler, PredictRequest, PredictResponse};
