// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classifier that forwards frames to another classify endpoint

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use image::RgbImage;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::types::{ClassifierError, Detections, Prediction};
use super::Classifier;
use crate::vision::encode_jpeg;

const JPEG_QUALITY: u8 = 90;

/// Posts each frame as multipart field `image` and reads the label back
///
/// Understands the reply shapes the sibling servers produce:
/// `{classification: "..."}`, `{classification: {name}}`, `{label}`,
/// `{objectName}`, `{prediction}` and `{classes: [..]}`.
pub struct RemoteClassifier {
    client: Client,
    endpoint: String,
    input_size: Option<u32>,
}

impl RemoteClassifier {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let endpoint = endpoint.trim_end_matches('/').to_string();
        url::Url::parse(&endpoint)?;

        info!("Remote classifier configured: endpoint={}", endpoint);

        Ok(Self {
            client,
            endpoint,
            input_size: None,
        })
    }

    /// Resize frames to this square size before forwarding
    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = Some(size);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn classify(&self, image: &RgbImage) -> Result<Detections, ClassifierError> {
        let jpeg = encode_jpeg(image, JPEG_QUALITY)
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let part = Part::bytes(jpeg)
            .file_name("image.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            warn!("Remote classifier returned {}: {}", status, message);
            return Err(ClassifierError::RemoteStatus {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;
        debug!("Remote classifier reply: {}", body);

        Ok(parse_remote_reply(&body))
    }

    fn name(&self) -> &str {
        "remote"
    }

    fn input_size(&self) -> Option<u32> {
        self.input_size
    }
}

/// Extract ranked predictions from a sibling server's JSON reply
pub fn parse_remote_reply(body: &Value) -> Detections {
    let confidence = body
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| if c > 1.0 { c / 100.0 } else { c })
        .unwrap_or(0.0) as f32;

    let label = match body.get("classification") {
        Some(Value::String(name)) => Some(name.clone()),
        Some(Value::Object(obj)) => obj.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
    .or_else(|| {
        ["label", "objectName", "prediction"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str).map(str::to_string))
    });

    if let Some(label) = label {
        return Detections::ranked(vec![Prediction::new(0, label, confidence)]);
    }

    // Raw index lists keep their order; there is no score to rank by
    let predictions = body
        .get("classes")
        .and_then(Value::as_array)
        .map(|classes| {
            classes
                .iter()
                .filter_map(Value::as_f64)
                .map(|id| {
                    let id = id as u32;
                    Prediction::new(id, format!("class_{}", id), 0.0)
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Detections::ranked(predictions)
}
