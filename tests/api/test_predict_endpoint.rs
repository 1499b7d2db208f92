// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Predict endpoint tests for POST /predict

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;
use sortyx::{classifier::StubClassifier, config::Profile, instruction::CannedChat};
use std::sync::Arc;

use super::common::{app_for, json_request, png_bytes, send};

#[tokio::test]
async fn test_predict_with_data_url() {
    let chat = Arc::new(CannedChat::new("unused"));
    let app = app_for(
        Profile::Webapp,
        StubClassifier::single("banana", 0.75),
        Some(chat.clone()),
    );
    let image = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes([250, 220, 0])));

    let (status, body) = send(app, json_request("/predict", json!({ "image": image }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "banana");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((confidence - 0.75).abs() < 1e-6);
    assert_eq!(chat.call_count(), 0);
}

#[tokio::test]
async fn test_predict_with_plain_base64() {
    let app = app_for(Profile::Webapp, StubClassifier::empty(), None);
    let image = STANDARD.encode(png_bytes([0, 0, 0]));

    let (status, body) = send(app, json_request("/predict", json!({ "image": image }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "Unknown");
    assert_eq!(body["confidence"], 0.0);
}

#[tokio::test]
async fn test_predict_missing_image() {
    let app = app_for(Profile::Webapp, StubClassifier::single("banana", 0.75), None);

    let (status, body) = send(app, json_request("/predict", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image data provided");
}

#[tokio::test]
async fn test_predict_invalid_base64() {
    let app = app_for(Profile::Webapp, StubClassifier::single("banana", 0.75), None);

    let (status, body) = send(
        app,
        json_request("/predict", json!({ "image": "data:image/png;base64,@@@not-base64@@@" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
