// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Tests for GET /, GET /health, GET /api/health and GET /api/categories

use axum::{
    body::to_bytes,
    http::{header, StatusCode},
};
use sortyx::{classifier::StubClassifier, config::Profile, instruction::CannedChat};
use std::sync::Arc;
use tower::util::ServiceExt;

use super::common::{app_for, get_request, send};

#[tokio::test]
async fn test_index_serves_upload_form() {
    let app = app_for(Profile::Flask, StubClassifier::empty(), None);

    let response = app.oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains(r#"name="image""#));
    assert!(html.contains(r#"action="/classify""#));
}

#[tokio::test]
async fn test_health_reports_collaborators() {
    for path in ["/health", "/api/health"] {
        let app = app_for(
            Profile::Flask,
            StubClassifier::empty(),
            Some(Arc::new(CannedChat::new("ok"))),
        );

        let (status, body) = send(app, get_request(path)).await;

        assert_eq!(status, StatusCode::OK, "{}", path);
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["classifier"], "stub");
        assert_eq!(body["chatModel"], "canned");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["timestamp"].is_string());
    }
}

#[tokio::test]
async fn test_health_without_chat_model() {
    let app = app_for(Profile::Fastapi, StubClassifier::empty(), None);

    let (status, body) = send(app, get_request("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["chatModel"].is_null());
}

#[tokio::test]
async fn test_categories_catalog() {
    let app = app_for(Profile::Webapp, StubClassifier::empty(), None);

    let (status, body) = send(app, get_request("/api/categories")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let ids: Vec<&str> = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["recyclable", "hazardous", "solid", "organic"]);
    assert_eq!(body["categories"][0]["icon"], "♻️");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = app_for(Profile::Flask, StubClassifier::empty(), None);

    let response = app.oneshot(get_request("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
