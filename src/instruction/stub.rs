// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Canned chat model for tests and offline runs

use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatError, ChatMessage, ChatModel};

/// Chat model that answers every prompt with the same text
///
/// Records the prompts it receives so callers can assert on them.
#[derive(Debug, Default)]
pub struct CannedChat {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl CannedChat {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A chat model whose every call fails
    pub fn failing() -> Self {
        Self::default()
    }

    /// Last user prompt received
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().ok().and_then(|p| p.last().cloned())
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ChatModel for CannedChat {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        if let Some(last) = messages.iter().rev().find(|m| m.role == "user") {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(last.content.clone());
            }
        }

        self.reply
            .clone()
            .ok_or_else(|| ChatError::Transport("connection refused".to_string()))
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}
