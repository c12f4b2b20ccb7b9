//! Core timeline data model.

use serde::{Deserialize, Serialize};

/// A single recognized, timestamped unit of on-screen text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionEvent {
    /// Seconds from the start of the video.
    pub timestamp_secs: f64,
    /// Caption content at that instant. Never empty.
    pub text: String,
}

impl CaptionEvent {
    pub fn new(timestamp_secs: f64, text: impl Into<String>) -> Self {
        Self {
            timestamp_secs,
            text: text.into(),
        }
    }

    /// Timestamp in whole milliseconds.
    pub fn timestamp_ms(&self) -> i64 {
        (self.timestamp_secs * 1000.0).round() as i64
    }
}

/// Ordered sequence of caption events for one video.
///
/// Invariants: events are sorted by timestamp ascending, and no two adjacent
/// events carry identical text. Both are maintained by the extractor; the
/// cleaning stage only removes events and so cannot break them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    events: Vec<CaptionEvent>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<CaptionEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[CaptionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CaptionEvent> {
        self.events.iter()
    }

    pub fn into_events(self) -> Vec<CaptionEvent> {
        self.events
    }
}

impl IntoIterator for Timeline {
    type Item = CaptionEvent;
    type IntoIter = std::vec::IntoIter<CaptionEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_ms_rounds() {
        assert_eq!(CaptionEvent::new(2.0, "a").timestamp_ms(), 2000);
        assert_eq!(CaptionEvent::new(1.0015, "a").timestamp_ms(), 1002);
        assert_eq!(CaptionEvent::new(0.0, "a").timestamp_ms(), 0);
    }
}
