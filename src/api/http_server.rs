// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::analyze::analyze_handler;
use super::classify::{classes_handler, classify_handler};
use super::handlers::{categories_handler, health_handler, index_handler};
use super::predict::predict_handler;
use crate::config::ServerConfig;
use crate::pipeline::ClassifyPipeline;

/// Multipart framing and base64 inflate uploads past the raw image ceiling
const BODY_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub pipeline: Arc<ClassifyPipeline>,
}

impl AppState {
    pub fn new(config: ServerConfig, pipeline: ClassifyPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes.saturating_mul(4) / 3 + BODY_OVERHEAD;

    Router::new()
        // Upload page
        .route("/", get(index_handler))
        // Classification
        .route("/classify", post(classify_handler))
        .route("/classify/", post(classes_handler))
        .route("/predict", post(predict_handler))
        .route("/api/classify", post(analyze_handler))
        // Catalog and health
        .route("/api/categories", get(categories_handler))
        .route("/health", get(health_handler))
        .route("/api/health", get(health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.socket_addr()?;
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
