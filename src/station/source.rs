// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Frame sources standing in for a camera

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use thiserror::Error;
use tracing::debug;

use crate::vision::{decode_image_bytes, ImageError};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff"];

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No images found in {}", .0.display())]
    Empty(PathBuf),

    #[error("Failed to decode frame: {0}")]
    Decode(#[from] ImageError),
}

#[async_trait]
pub trait FrameSource: Send {
    /// Grab the next frame
    async fn capture(&mut self) -> Result<DynamicImage, SourceError>;

    fn describe(&self) -> String;
}

/// Cycles through image files, one per capture
#[derive(Debug)]
pub struct ImageFileSource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageFileSource {
    /// A single image file, or every image file in a directory (sorted by name)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let io_err = |source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        };

        let paths = if path.is_dir() {
            let mut paths: Vec<PathBuf> = std::fs::read_dir(path)
                .map_err(io_err)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && has_image_extension(p))
                .collect();
            paths.sort();
            paths
        } else {
            std::fs::metadata(path).map_err(io_err)?;
            vec![path.to_path_buf()]
        };

        if paths.is_empty() {
            return Err(SourceError::Empty(path.to_path_buf()));
        }

        Ok(Self { paths, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[async_trait]
impl FrameSource for ImageFileSource {
    async fn capture(&mut self) -> Result<DynamicImage, SourceError> {
        let path = self.paths[self.next].clone();
        self.next = (self.next + 1) % self.paths.len();

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            })?;
        let (image, info) = decode_image_bytes(&bytes)?;
        debug!(
            "Captured {} ({}x{})",
            path.display(),
            info.width,
            info.height
        );
        Ok(image)
    }

    fn describe(&self) -> String {
        match self.paths.as_slice() {
            [single] => format!("file {}", single.display()),
            paths => format!("{} image files", paths.len()),
        }
    }
}

/// Solid-colour frames at camera resolution
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    color: [u8; 3],
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self {
            width,
            height,
            color,
        }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(640, 480, [128, 128, 128])
    }
}

#[async_trait]
impl FrameSource for SyntheticSource {
    async fn capture(&mut self) -> Result<DynamicImage, SourceError> {
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            self.width,
            self.height,
            Rgb(self.color),
        )))
    }

    fn describe(&self) -> String {
        format!("synthetic {}x{}", self.width, self.height)
    }
}
