//! OpenAI speech endpoint client.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::config::{TtsModel, TtsVoice};
use crate::error::{CapvoiceError, Result};

use super::SpeechSynthesizer;

const SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Speech synthesizer backed by the OpenAI audio API. Returns MP3 bytes.
pub struct OpenAiSynthesizer {
    client: Client,
    api_key: String,
    model: TtsModel,
    voice: TtsVoice,
}

impl OpenAiSynthesizer {
    pub fn new(api_key: impl Into<String>, model: TtsModel, voice: TtsVoice) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model,
            voice,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(SPEECH_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": self.model.as_str(),
                "voice": self.voice.as_str(),
                "input": text,
                "response_format": "mp3",
                "speed": 1.0,
            }))
            .send()
            .await
            .map_err(|e| CapvoiceError::SynthesisUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CapvoiceError::SynthesisUnavailable(format!(
                "speech API returned {}: {}",
                status, text
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CapvoiceError::SynthesisUnavailable(e.to_string()))?;
        if bytes.is_empty() {
            return Err(CapvoiceError::SynthesisUnavailable(
                "speech API returned an empty body".to_string(),
            ));
        }

        debug!("Synthesized {} bytes of speech", bytes.len());
        Ok(bytes.to_vec())
    }
}
