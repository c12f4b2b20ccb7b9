//! Google Cloud Vision text detection client.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{CapvoiceError, Result};

use super::TextRecognizer;

const ANNOTATE_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    feature_type: String,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(rename = "textAnnotations", default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    message: String,
}

/// Text recognizer backed by the Google Cloud Vision REST API.
pub struct GoogleVisionRecognizer {
    client: Client,
    api_key: String,
}

impl GoogleVisionRecognizer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl TextRecognizer for GoogleVisionRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<Option<String>> {
        let body = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(image),
                },
                features: vec![Feature {
                    feature_type: "TEXT_DETECTION".to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(format!("{}?key={}", ANNOTATE_URL, self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| CapvoiceError::RecognitionUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CapvoiceError::RecognitionUnavailable(format!(
                "Vision API returned {}: {}",
                status, text
            )));
        }

        let parsed: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| CapvoiceError::RecognitionUnavailable(e.to_string()))?;

        let Some(first) = parsed.responses.into_iter().next() else {
            return Ok(None);
        };
        if let Some(err) = first.error {
            return Err(CapvoiceError::RecognitionUnavailable(err.message));
        }

        // The first annotation carries the full detected text block.
        match first.text_annotations.into_iter().next() {
            Some(annotation) => {
                let text = annotation.description.trim().to_string();
                if text.is_empty() {
                    Ok(None)
                } else {
                    debug!("Detected text: {}", text);
                    Ok(Some(text))
                }
            }
            None => Ok(None),
        }
    }
}
