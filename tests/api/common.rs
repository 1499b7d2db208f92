// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shared helpers for router-level tests

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use sortyx::{
    api::{create_app, AppState},
    classifier::StubClassifier,
    config::{Profile, ServerConfig},
    instruction::CannedChat,
    pipeline::ClassifyPipeline,
};
use std::io::Cursor;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

pub const BOUNDARY: &str = "sortyx-test-boundary";

/// Small PNG filled with one colour
pub fn png_bytes(color: [u8; 3]) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbImage::from_pixel(16, 16, Rgb(color))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Multipart body with a single file field
pub fn multipart_body(field: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"upload.png\"\r\n",
            field
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, field: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(field, data)))
        .unwrap()
}

pub fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Router for a profile with a stub classifier and optional canned chat reply
pub fn app_for(
    profile: Profile,
    classifier: StubClassifier,
    chat: Option<Arc<CannedChat>>,
) -> Router {
    app_with_config(profile.preset(), classifier, chat)
}

pub fn app_with_config(
    config: ServerConfig,
    classifier: StubClassifier,
    chat: Option<Arc<CannedChat>>,
) -> Router {
    let pipeline = ClassifyPipeline::new(Arc::new(classifier), config.pipeline_settings());
    let pipeline = match chat {
        Some(chat) => pipeline.with_chat(chat),
        None => pipeline,
    };
    create_app(AppState::new(config, pipeline))
}

/// Send one request and decode the JSON body
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
