//! Timeline extraction: turns sampled frame detections into caption events.
//!
//! Deduplication compares each detection against the text of the last
//! emitted event only. Empty detections leave that cursor untouched, so a
//! caption that vanishes and later reappears with identical text is still
//! suppressed; only a different caption in between makes the repeat a new
//! event.

use log::{debug, warn};
use tokio::time::timeout;

use crate::config::PipelineConfig;
use crate::error::{CapvoiceError, Result};
use crate::media::frames::FrameSource;
use crate::ocr::TextRecognizer;
use crate::CancelToken;

use super::types::{CaptionEvent, Timeline};

/// Fold state threaded through the detection sequence: the text of the last
/// emitted event plus the events accumulated so far.
#[derive(Debug, Default)]
struct ExtractState {
    last_text: Option<String>,
    events: Vec<CaptionEvent>,
}

impl ExtractState {
    /// One fold step. Emits an event only for a non-empty detection that
    /// differs from the previous one.
    fn step(&mut self, frame_index: u64, detected: Option<String>, fps: f64) {
        let Some(text) = detected else { return };
        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }
        if self.last_text.as_deref() == Some(text.as_str()) {
            return;
        }
        self.events
            .push(CaptionEvent::new(frame_index as f64 / fps, text.clone()));
        self.last_text = Some(text);
    }
}

/// Builds a timeline from an already-recognized sequence of
/// `(frame index, detected text)` pairs. Pure; the async driver below feeds
/// it from a live frame source.
pub fn build_timeline(
    detections: impl IntoIterator<Item = (u64, Option<String>)>,
    fps: f64,
) -> Timeline {
    let mut state = ExtractState::default();
    for (index, detected) in detections {
        state.step(index, detected, fps);
    }
    Timeline::from_events(state.events)
}

/// Drains a frame source, recognizing text in every sampled frame, and
/// returns the deduplicated timeline.
///
/// Recognition failures and timeouts are per-frame: they are logged and
/// treated as "no text detected". Only a cancelled run returns an error here;
/// a source that cannot be opened fails earlier, in [`FrameSource`]
/// construction.
pub async fn extract_timeline(
    source: &mut dyn FrameSource,
    recognizer: &dyn TextRecognizer,
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> Result<Timeline> {
    let fps = config.fps_override.unwrap_or_else(|| source.fps());
    if fps <= 0.0 {
        return Err(CapvoiceError::Configuration(format!(
            "invalid frame rate: {fps}"
        )));
    }

    let mut state = ExtractState::default();
    let mut sampled = 0usize;
    let mut failed = 0usize;

    while let Some(frame) = source.next_frame()? {
        if cancel.is_cancelled() {
            return Err(CapvoiceError::Cancelled);
        }
        sampled += 1;
        debug!("Recognizing text in frame {}", frame.index);

        let detected = match timeout(config.request_timeout(), recognizer.recognize(&frame.image))
            .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!("Text recognition failed for frame {}: {}", frame.index, e);
                failed += 1;
                None
            }
            Err(_) => {
                warn!("Text recognition timed out for frame {}", frame.index);
                failed += 1;
                None
            }
        };

        state.step(frame.index, detected, fps);
    }

    log::info!(
        "Extracted {} caption events from {} sampled frames ({} recognition failures)",
        state.events.len(),
        sampled,
        failed
    );
    Ok(Timeline::from_events(state.events))
}
