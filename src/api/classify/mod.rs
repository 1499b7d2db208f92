// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classify API endpoint module
//!
//! Provides POST /classify and POST /classify/ for multipart image uploads.

pub mod handler;
pub mod response;

pub use handler::{classes_handler, classify_handler, read_image_field, CLASSES_FIELDS, IMAGE_FIELD};
pub use response::{
    ClassesResponse, ClassifyResponse, ComponentView, DetailedResponse, InstructionResponse,
    LabelledResponse,
};
