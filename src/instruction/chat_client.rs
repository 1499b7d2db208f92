// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chat client for OpenAI-compatible completion APIs (Ollama, llama.cpp server)

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::{ChatError, ChatMessage, ChatModel};

/// Model tag pulled by a stock local Ollama install
pub const DEFAULT_CHAT_MODEL: &str = "llama3.2:latest";

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(serde::Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Client for a chat model behind `/v1/chat/completions`
pub struct ChatClient {
    client: Client,
    endpoint: String,
    model_name: String,
}

impl ChatClient {
    /// Create a new chat client
    pub fn new(endpoint: &str, model_name: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        url::Url::parse(&endpoint)?;
        info!(
            "Chat client configured: endpoint={}, model={}",
            endpoint, model_name
        );

        Ok(Self {
            client,
            endpoint,
            model_name: model_name.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.endpoint)
    }
}

#[async_trait]
impl ChatModel for ChatClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let start = std::time::Instant::now();
        let request = ChatRequest {
            model: &self.model_name,
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(self.completions_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidReply(e.to_string()))?;

        let text = first_choice_text(chat_response.choices)?;
        let tokens_used = chat_response.usage.map(|u| u.total_tokens).unwrap_or(0);

        debug!(
            "Chat reply: {} chars, {} tokens, {}ms (model: {})",
            text.len(),
            tokens_used,
            start.elapsed().as_millis(),
            self.model_name
        );

        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn first_choice_text(choices: Vec<ChatChoice>) -> Result<String, ChatError> {
    choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| ChatError::InvalidReply("reply contained no choices".to_string()))
}
