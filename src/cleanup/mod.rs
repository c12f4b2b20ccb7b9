//! Grammar cleanup seam.

pub mod openai;

use async_trait::async_trait;

use crate::error::Result;

pub use openai::OpenAiCleaner;

/// Cleans a caption for grammar and clarity without changing its meaning.
///
/// Consumed as a black box: text in, cleaned text or failure out. The text
/// pipeline applies its own refusal and drift checks on top of whatever the
/// implementation returns.
#[async_trait]
pub trait TextCleaner: Send + Sync {
    async fn clean(&self, text: &str) -> Result<String>;
}
