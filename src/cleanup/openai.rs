//! OpenAI chat completions client for subtitle cleanup.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{CapvoiceError, Result};

use super::TextCleaner;

const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are a subtitle cleaning assistant. Your task is to clean \
subtitles for grammar and clarity without changing their meaning or adding extra details.";

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Subtitle cleaner backed by the OpenAI chat completions API.
pub struct OpenAiCleaner {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiCleaner {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextCleaner for OpenAiCleaner {
    async fn clean(&self, text: &str) -> Result<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: format!(
                        "Please clean the following subtitle but preserve the meaning exactly: '{}'.",
                        text.trim()
                    ),
                },
            ],
            // No creativity wanted; the drift guard rejects embellishments anyway.
            temperature: 0.0,
            max_tokens: 50,
        };

        let response = self
            .client
            .post(CHAT_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| CapvoiceError::CleanupUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CapvoiceError::CleanupUnavailable(format!(
                "chat API returned {}: {}",
                status, text
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| CapvoiceError::CleanupUnavailable(e.to_string()))?;

        let cleaned = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| {
                CapvoiceError::CleanupUnavailable("chat API returned no choices".to_string())
            })?;

        debug!("Cleaned caption: {}", cleaned);
        Ok(cleaned)
    }
}
