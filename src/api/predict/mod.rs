// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Predict API endpoint module
//!
//! Provides POST /predict for base64 JSON uploads.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::predict_handler;
pub use request::PredictRequest;
pub use response::PredictResponse;
