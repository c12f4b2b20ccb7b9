//! Text recognition seam.

pub mod vision;

use async_trait::async_trait;

use crate::error::Result;

pub use vision::GoogleVisionRecognizer;

/// Recognizes on-screen text in an encoded image.
///
/// Implementations are consumed as a black box: image in, recognized text or
/// nothing out. A failed call maps to
/// [`CapvoiceError::RecognitionUnavailable`](crate::error::CapvoiceError::RecognitionUnavailable)
/// and is treated by the extractor as "no text detected" for that frame.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Returns the recognized text, or `None` when the frame has none.
    async fn recognize(&self, image: &[u8]) -> Result<Option<String>>;
}
