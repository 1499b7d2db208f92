// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Analyze endpoint tests for POST /api/classify

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;
use sortyx::{classifier::StubClassifier, config::Profile, instruction::CannedChat};
use std::sync::Arc;

use super::common::{app_for, json_request, png_bytes, send};

#[tokio::test]
async fn test_analyze_structured_reply() {
    let chat = Arc::new(CannedChat::new(
        "Object: Plastic water bottle\n\
         Components: bottle; cap\n\
         Categories: Recyclable Waste; Solid Waste\n\
         Reasons: PET plastic; mixed polymer\n\
         Confidence: 88",
    ));
    // Flask is configured for the short prompt; the route still asks for lines
    let app = app_for(
        Profile::Flask,
        StubClassifier::single("bottle", 0.4),
        Some(chat.clone()),
    );
    let image = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes([30, 90, 200])));

    let (status, body) = send(app, json_request("/api/classify", json!({ "imageData": image }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["objectName"], "Plastic water bottle");
    assert_eq!(body["classification"]["id"], "recyclable");
    assert_eq!(body["confidence"], 88);
    assert_eq!(body["components"].as_array().unwrap().len(), 2);
    assert_eq!(body["components"][1]["name"], "cap");

    let prompt = chat.last_prompt().unwrap();
    assert!(prompt.contains("'bottle'"));
    assert!(prompt.contains("Categories: ["));
}

#[tokio::test]
async fn test_analyze_plain_base64_without_chat() {
    let app = app_for(Profile::Fastapi, StubClassifier::single("cup", 0.64), None);
    let image = STANDARD.encode(png_bytes([8, 8, 8]));

    let (status, body) = send(app, json_request("/api/classify", json!({ "imageData": image }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["objectName"], "cup");
    assert_eq!(body["confidence"], 64);
    assert_eq!(body["components"][0]["name"], "cup");
}

#[tokio::test]
async fn test_analyze_missing_image_data() {
    let app = app_for(Profile::Webapp, StubClassifier::single("cup", 0.64), None);

    let (status, body) = send(app, json_request("/api/classify", json!({ "image": "AAAA" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image data provided");
}

#[tokio::test]
async fn test_analyze_chat_failure() {
    let app = app_for(
        Profile::Webapp,
        StubClassifier::single("cup", 0.64),
        Some(Arc::new(CannedChat::failing())),
    );
    let image = STANDARD.encode(png_bytes([8, 8, 8]));

    let (status, _) = send(app, json_request("/api/classify", json!({ "imageData": image }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
