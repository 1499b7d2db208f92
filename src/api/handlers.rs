// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, response::Html, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::http_server::AppState;
use crate::catalog::{waste_categories, WasteCategory};
use crate::version::VERSION_NUMBER;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Sortyx waste classifier</title>
</head>
<body>
  <h1>Waste classifier</h1>
  <form action="/classify" method="post" enctype="multipart/form-data">
    <input type="file" name="image" accept="image/*" required>
    <button type="submit">Classify</button>
  </form>
</body>
</html>
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub message: String,
    pub classifier: String,
    pub chat_model: Option<String>,
    pub version: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: Vec<WasteCategory>,
}

/// GET / - minimal upload page
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health, GET /api/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "healthy".to_string(),
        message: "Waste classification API is running".to_string(),
        classifier: state.pipeline.classifier_name().to_string(),
        chat_model: state.pipeline.chat_model_name().map(str::to_string),
        version: VERSION_NUMBER.to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// GET /api/categories - the display catalog
pub async fn categories_handler() -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        success: true,
        categories: waste_categories(),
    })
}
