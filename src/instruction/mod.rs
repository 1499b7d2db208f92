// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Disposal-instruction generation via a chat-style language model
//!
//! The label from the classifier is embedded in a one-sentence prompt and the
//! model's free-text reply is passed through unchanged.

pub mod chat_client;
pub mod prompts;
pub mod reply;
pub mod stub;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use chat_client::{ChatClient, DEFAULT_CHAT_MODEL};
pub use prompts::{build_prompt, PromptStyle};
pub use reply::{
    extract_confidence, parse_structured_reply, StructuredComponent, StructuredReply,
    DEFAULT_CONFIDENCE, DEFAULT_STRUCTURED_CONFIDENCE,
};
pub use stub::CannedChat;

/// One chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// Errors from the chat backend
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Chat request failed: {0}")]
    Transport(String),

    #[error("Chat service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Chat reply could not be parsed: {0}")]
    InvalidReply(String),
}

/// A chat-style language model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Submit the conversation and return the reply text
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;

    /// Model identifier for logging and health output
    fn model_name(&self) -> &str;
}
