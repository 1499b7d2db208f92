// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Classify endpoint tests for POST /classify and POST /classify/
//!
//! These tests verify that the classify handlers:
//! - Report the top-ranked label, or "Unknown" when nothing was detected
//! - Return 400 with an `error` key for missing or bad uploads in every shape
//! - Apply strict label validation before the chat model is called
//! - Map downstream failures to 500

use axum::http::StatusCode;
use serde_json::json;
use sortyx::{
    classifier::{Prediction, StubClassifier},
    config::{Profile, ResponseShape},
    instruction::CannedChat,
};
use std::sync::Arc;

use super::common::{app_for, app_with_config, json_request, multipart_request, png_bytes, send};

#[tokio::test]
async fn test_instruction_shape_returns_label_and_reply() {
    let chat = Arc::new(CannedChat::new("Rinse the bottle and put it in the plastics bin."));
    let app = app_for(
        Profile::Flask,
        StubClassifier::single("plastic", 0.91),
        Some(chat.clone()),
    );

    let (status, body) = send(app, multipart_request("/classify", "image", &png_bytes([9, 9, 9]))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "label": "plastic",
            "instruction": "Rinse the bottle and put it in the plastics bin."
        })
    );
    assert_eq!(
        chat.last_prompt().as_deref(),
        Some("Give a waste disposal instruction for 'plastic'")
    );
}

#[tokio::test]
async fn test_top_ranked_label_wins() {
    let classifier = StubClassifier::new(vec![
        Prediction::new(1, "paper", 0.40),
        Prediction::new(2, "glass", 0.85),
        Prediction::new(3, "metal", 0.10),
    ]);
    let app = app_for(Profile::Keras, classifier, None);

    let (status, body) = send(app, multipart_request("/classify", "image", &png_bytes([1, 2, 3]))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "glass");
    assert_eq!(body["confidence"], 85);
}

#[tokio::test]
async fn test_no_detections_is_unknown() {
    let app = app_for(Profile::Keras, StubClassifier::empty(), None);

    let (status, body) = send(app, multipart_request("/classify", "image", &png_bytes([0, 0, 0]))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"label": "Unknown", "confidence": 0}));
}

#[tokio::test]
async fn test_missing_image_field_is_400_for_every_shape() {
    for profile in [Profile::Flask, Profile::Webapp, Profile::Fastapi, Profile::Keras] {
        let chat = Arc::new(CannedChat::new("unused"));
        let app = app_for(profile, StubClassifier::single("paper", 0.9), Some(chat.clone()));

        let (status, body) = send(app, multipart_request("/classify", "file", &png_bytes([5, 5, 5]))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "profile {}", profile);
        assert_eq!(body["error"], "No image uploaded", "profile {}", profile);
        assert_eq!(chat.call_count(), 0);
    }
}

#[tokio::test]
async fn test_non_multipart_body_is_400() {
    let app = app_for(Profile::Flask, StubClassifier::single("paper", 0.9), None);

    let (status, body) = send(app, json_request("/classify", json!({"image": "abc"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn test_undecodable_upload_is_400() {
    let app = app_for(Profile::Keras, StubClassifier::single("paper", 0.9), None);

    let (status, body) = send(app, multipart_request("/classify", "image", b"not an image at all")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorType"], "invalid_request");
}

#[tokio::test]
async fn test_strict_mode_rejects_unlisted_label_regardless_of_confidence() {
    let chat = Arc::new(CannedChat::new("unused"));
    let app = app_for(
        Profile::Flask,
        StubClassifier::single("bottle", 0.99),
        Some(chat.clone()),
    );

    let (status, body) = send(app, multipart_request("/classify", "image", &png_bytes([7, 7, 7]))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown category");
    assert_eq!(body["errorType"], "validation_error");
    assert_eq!(chat.call_count(), 0);
}

#[tokio::test]
async fn test_strict_mode_is_case_insensitive() {
    let chat = Arc::new(CannedChat::new("Compost it."));
    let app = app_for(Profile::Flask, StubClassifier::single("Organic", 0.3), Some(chat));

    let (status, body) = send(app, multipart_request("/classify", "image", &png_bytes([7, 7, 7]))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "Organic");
}

#[tokio::test]
async fn test_strict_mode_rejects_unknown_label() {
    let app = app_for(Profile::Flask, StubClassifier::empty(), None);

    let (status, body) = send(app, multipart_request("/classify", "image", &png_bytes([7, 7, 7]))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown category");
}

#[tokio::test]
async fn test_chat_failure_is_500_with_detail() {
    let app = app_for(
        Profile::Flask,
        StubClassifier::single("paper", 0.8),
        Some(Arc::new(CannedChat::failing())),
    );

    let (status, body) = send(app, multipart_request("/classify", "image", &png_bytes([3, 3, 3]))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Instruction generation failed"));
    assert!(error.contains("connection refused"));
}

#[tokio::test]
async fn test_chat_failure_detail_hidden_when_disabled() {
    let mut config = Profile::Flask.preset();
    config.expose_error_details = false;
    let app = app_with_config(
        config,
        StubClassifier::single("paper", 0.8),
        Some(Arc::new(CannedChat::failing())),
    );

    let (status, body) = send(app, multipart_request("/classify", "image", &png_bytes([3, 3, 3]))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Instruction generation failed");
}

#[tokio::test]
async fn test_detailed_shape_extracts_reply_confidence() {
    let chat = Arc::new(CannedChat::new(
        "Category: recyclable. Rinse it first. confidence: 73%",
    ));
    let app = app_for(Profile::Webapp, StubClassifier::single("bottle", 0.5), Some(chat.clone()));

    let (status, body) = send(app, multipart_request("/classify", "image", &png_bytes([4, 4, 4]))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["objectName"], "bottle");
    assert_eq!(body["confidence"], 73);
    assert_eq!(body["components"][0]["classification"]["id"], "bottle");
    assert!(chat
        .last_prompt()
        .unwrap()
        .ends_with("Also say confidence level (0-100%)"));
}

#[tokio::test]
async fn test_detailed_shape_defaults_confidence_without_number() {
    let chat = Arc::new(CannedChat::new("Put it in the blue bin."));
    let app = app_for(Profile::Webapp, StubClassifier::single("can", 0.5), Some(chat));

    let (status, body) = send(app, multipart_request("/classify", "image", &png_bytes([4, 4, 4]))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confidence"], 80);
}

#[tokio::test]
async fn test_classes_shape() {
    let classifier = StubClassifier::new(vec![
        Prediction::new(39, "bottle", 0.7),
        Prediction::new(41, "cup", 0.6),
    ]);
    let app = app_for(Profile::Fastapi, classifier, None);

    let (status, body) = send(app, multipart_request("/classify", "image", &png_bytes([2, 2, 2]))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"classes": [39, 41]}));
}

#[tokio::test]
async fn test_trailing_slash_route_returns_classes_for_any_shape() {
    let chat = Arc::new(CannedChat::new("unused"));
    let config = Profile::Flask.preset();
    assert_eq!(config.response_shape, ResponseShape::Instruction);
    let app = app_with_config(
        config,
        StubClassifier::new(vec![Prediction::new(44, "spoon", 0.4)]),
        Some(chat.clone()),
    );

    let (status, body) = send(app, multipart_request("/classify/", "image", &png_bytes([2, 2, 2]))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"classes": [44]}));
    assert_eq!(chat.call_count(), 0);
}

#[tokio::test]
async fn test_trailing_slash_route_accepts_file_field() {
    let app = app_for(
        Profile::Fastapi,
        StubClassifier::new(vec![Prediction::new(39, "bottle", 0.8)]),
        None,
    );

    let (status, body) = send(app, multipart_request("/classify/", "file", &png_bytes([2, 2, 2]))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"classes": [39]}));
}

#[tokio::test]
async fn test_classify_route_still_requires_image_field() {
    let app = app_for(Profile::Fastapi, StubClassifier::single("bottle", 0.8), None);

    let (status, body) = send(app, multipart_request("/classify", "file", &png_bytes([2, 2, 2]))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image uploaded");
}
