// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Camera capture client
//!
//! Grabs frames from a [`FrameSource`], shrinks them to 640x480 JPEG and
//! posts them to a classify server as multipart field `image`.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::station::{FrameSource, SourceError};
use crate::vision::{encode_jpeg, resize_exact, ImageError};

pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;
const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to capture frame: {0}")]
    Source(#[from] SourceError),

    #[error("Failed to encode frame: {0}")]
    Encode(#[from] ImageError),

    #[error("Error sending image to server: {0}")]
    Transport(String),

    #[error("Error from server ({status}): {body}")]
    Server { status: u16, body: Value },

    #[error("Failed to save frame: {0}")]
    Save(String),
}

pub struct CaptureClient {
    client: Client,
    endpoint: String,
}

impl CaptureClient {
    pub fn new(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        url::Url::parse(endpoint)?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post one JPEG and return the server's JSON reply
    pub async fn send_jpeg(&self, jpeg: Vec<u8>) -> Result<Value, CaptureError> {
        let part = Part::bytes(jpeg)
            .file_name("image.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| CaptureError::Transport(e.to_string()))?;
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CaptureError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CaptureError::Transport(e.to_string()))?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if status.is_success() {
            Ok(body)
        } else {
            Err(CaptureError::Server {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub interval: Duration,
    /// Stop after this many frames; `None` runs until cancelled
    pub max_frames: Option<u64>,
    /// Write each frame here before sending it
    pub save_path: Option<PathBuf>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_frames: None,
            save_path: None,
        }
    }
}

/// Grab one frame and prepare the upload bytes
pub async fn prepare_frame(
    source: &mut dyn FrameSource,
    save_path: Option<&PathBuf>,
) -> Result<Vec<u8>, CaptureError> {
    let frame = source.capture().await?.to_rgb8();

    if let Some(path) = save_path {
        frame
            .save(path)
            .map_err(|e| CaptureError::Save(format!("{}: {}", path.display(), e)))?;
    }

    let resized = resize_exact(&frame, FRAME_WIDTH, FRAME_HEIGHT);
    Ok(encode_jpeg(&resized, JPEG_QUALITY)?)
}

/// Capture, send, print and sleep until done or cancelled
///
/// Returns the number of frames the server accepted. Failures are logged and
/// the loop moves on to the next frame.
pub async fn run_capture(
    client: &CaptureClient,
    source: &mut dyn FrameSource,
    options: &CaptureOptions,
    cancel: CancellationToken,
) -> u64 {
    let mut sent = 0u64;
    let mut attempts = 0u64;

    info!(
        "Capture loop started: source={}, endpoint={}",
        source.describe(),
        client.endpoint()
    );

    loop {
        if cancel.is_cancelled() || options.max_frames.is_some_and(|max| attempts >= max) {
            break;
        }
        attempts += 1;

        let result = match prepare_frame(source, options.save_path.as_ref()).await {
            Ok(jpeg) => client.send_jpeg(jpeg).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(reply) => {
                sent += 1;
                println!("Prediction: {}", reply);
            }
            Err(e) => {
                warn!("{}", e);
                eprintln!("{}", e);
            }
        }

        if options.max_frames.is_some_and(|max| attempts >= max) {
            break;
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(options.interval) => {}
        }
    }

    info!("Capture loop stopped: {} of {} frames accepted", sent, attempts);
    sent
}
