//! Text pipeline: validity filtering, external cleanup and deduplication.
//!
//! Runs after the full timeline has been extracted because the final step
//! deduplicates against every caption emitted earlier in the pass, not just
//! the adjacent one. Every drop is logged with its reason and content, so
//! processed-vs-skipped counts can be read off the log stream.

use std::collections::HashSet;

use log::{info, warn};
use tokio::time::timeout;

use crate::cleanup::TextCleaner;
use crate::error::{CapvoiceError, Result};
use crate::CancelToken;

use super::drift::DriftGuard;
use super::filter::ValidityFilter;
use super::types::{CaptionEvent, Timeline};

/// Markers that identify a cleanup response as a refusal or meta commentary
/// rather than a cleaned caption.
pub const REFUSAL_MARKERS: [&str; 4] = ["I'm ready", "help", "error", "context"];

/// Returns true if a cleanup response matches a refusal marker.
pub fn is_refusal(response: &str) -> bool {
    REFUSAL_MARKERS.iter().any(|m| response.contains(m))
}

/// Counts of kept and dropped events from one cleaning pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanStats {
    pub kept: usize,
    pub dropped_invalid: usize,
    pub dropped_cleanup_failed: usize,
    pub dropped_refusal: usize,
    pub dropped_drift: usize,
    pub dropped_duplicate: usize,
}

impl CleanStats {
    pub fn dropped(&self) -> usize {
        self.dropped_invalid
            + self.dropped_cleanup_failed
            + self.dropped_refusal
            + self.dropped_drift
            + self.dropped_duplicate
    }
}

/// Cleans a timeline: for each event in order, applies the validity filter,
/// the external cleanup call, the drift guard and a global duplicate check.
///
/// Output preserves input ordering and timestamps; it only ever shrinks.
/// All failures are per-event and non-fatal; the pass always completes with
/// whatever survives, unless the run is cancelled.
pub async fn clean_timeline(
    timeline: &Timeline,
    cleaner: &dyn TextCleaner,
    filter: &ValidityFilter,
    guard: &DriftGuard,
    request_timeout: std::time::Duration,
    cancel: &CancelToken,
) -> Result<(Timeline, CleanStats)> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut cleaned: Vec<CaptionEvent> = Vec::new();
    let mut stats = CleanStats::default();

    for event in timeline.iter() {
        if cancel.is_cancelled() {
            return Err(CapvoiceError::Cancelled);
        }

        if !filter.is_valid(&event.text) {
            info!("Skipping invalid caption: {}", event.text);
            stats.dropped_invalid += 1;
            continue;
        }

        let response = match timeout(request_timeout, cleaner.clean(event.text.trim())).await {
            Ok(Ok(text)) => text.trim().to_string(),
            Ok(Err(e)) => {
                warn!("Cleanup failed for caption '{}': {}", event.text, e);
                stats.dropped_cleanup_failed += 1;
                continue;
            }
            Err(_) => {
                warn!("Cleanup timed out for caption '{}'", event.text);
                stats.dropped_cleanup_failed += 1;
                continue;
            }
        };

        if is_refusal(&response) {
            info!("Skipping irrelevant cleanup response: {}", response);
            stats.dropped_refusal += 1;
            continue;
        }

        if !guard.is_acceptable_revision(&event.text, &response) {
            info!(
                "Skipping drifted cleanup of '{}' -> '{}'",
                event.text, response
            );
            stats.dropped_drift += 1;
            continue;
        }

        if seen.contains(&response) {
            info!("Skipping duplicate caption: {}", response);
            stats.dropped_duplicate += 1;
            continue;
        }

        seen.insert(response.clone());
        cleaned.push(CaptionEvent::new(event.timestamp_secs, response));
        stats.kept += 1;
    }

    info!(
        "Cleaned timeline: {} kept, {} dropped ({} invalid, {} cleanup failures, {} refusals, {} drifted, {} duplicates)",
        stats.kept,
        stats.dropped(),
        stats.dropped_invalid,
        stats.dropped_cleanup_failed,
        stats.dropped_refusal,
        stats.dropped_drift,
        stats.dropped_duplicate
    );

    Ok((Timeline::from_events(cleaned), stats))
}
