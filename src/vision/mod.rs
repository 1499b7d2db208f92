// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image ingestion for the classify pipeline
//!
//! Uploads and camera frames are decoded here, normalised to RGB and resized
//! to the square resolution the configured model expects.

pub mod image_utils;

pub use image_utils::{
    decode_base64_image, decode_base64_image_with_limit, decode_image_bytes,
    decode_image_bytes_with_limit, detect_format, encode_jpeg, normalize, resize_exact,
    ImageError, ImageInfo, MAX_IMAGE_SIZE,
};
