// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze API endpoint module
//!
//! Provides POST /api/classify for the web front-end: a base64 image in,
//! a component breakdown mapped onto the waste catalog out.

pub mod handler;
pub mod request;

pub use handler::analyze_handler;
pub use request::AnalyzeRequest;
