//! Speech synthesis seam.

pub mod openai;

use async_trait::async_trait;

use crate::error::Result;
use crate::subtitle::CaptionEvent;

pub use openai::OpenAiSynthesizer;

/// Synthesizes speech for caption text, returning encoded audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// A decoded per-event synthesis result, ready for track assembly.
///
/// Owned by the reconstructor only for the duration of assembly.
#[derive(Debug, Clone)]
pub struct SynthesizedClip {
    /// Position of the event in the cleaned timeline (0-based).
    pub index: usize,
    /// The caption event this clip renders.
    pub event: CaptionEvent,
    /// Encoded audio as returned by the synthesizer.
    pub encoded: Vec<u8>,
    /// Decoded mono PCM samples.
    pub samples: Vec<f32>,
    /// Sample rate of the decoded samples.
    pub sample_rate: u32,
}

impl SynthesizedClip {
    /// Decoded playback length in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as i64 * 1000 / self.sample_rate as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_from_samples_and_rate() {
        let clip = SynthesizedClip {
            index: 0,
            event: CaptionEvent::new(0.0, "x"),
            encoded: Vec::new(),
            samples: vec![0.0; 12_000],
            sample_rate: 24_000,
        };
        assert_eq!(clip.duration_ms(), 500);
    }
}
