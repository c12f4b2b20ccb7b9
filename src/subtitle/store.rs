//! Persisted timeline format: one `"<timestamp>: <text>"` line per event.
//!
//! Timestamps are written with two decimal digits and parsed back as plain
//! floats, so a round trip is lossy below 10ms. The whole file is built in
//! memory and written once; a malformed line on read is skipped with a
//! warning and never aborts the file.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::error::{CapvoiceError, Result};

use super::types::{CaptionEvent, Timeline};

/// Writes a timeline to `path`, overwriting any previous content.
pub fn save_timeline(timeline: &Timeline, path: &Path) -> Result<()> {
    let mut content = String::new();
    for event in timeline.iter() {
        // write! to a String cannot fail.
        let _ = writeln!(content, "{:.2}: {}", event.timestamp_secs, event.text);
    }
    fs::write(path, content)?;
    info!("Saved {} caption events to {}", timeline.len(), path.display());
    Ok(())
}

/// Loads a timeline from `path`.
///
/// Each line is split on the first colon into a timestamp and text. Lines
/// that do not split, carry an unparsable timestamp or have empty text are
/// logged and skipped.
pub fn load_timeline(path: &Path) -> Result<Timeline> {
    let content = fs::read_to_string(path)?;
    let mut events = Vec::new();
    let mut skipped = 0usize;

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line_no + 1, line) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!("Skipping {}", e);
                skipped += 1;
            }
        }
    }

    info!(
        "Loaded {} caption events from {} ({} malformed lines skipped)",
        events.len(),
        path.display(),
        skipped
    );
    Ok(Timeline::from_events(events))
}

fn parse_line(line_no: usize, line: &str) -> Result<CaptionEvent> {
    let malformed = || CapvoiceError::MalformedTimelineLine {
        line: line_no,
        content: line.to_string(),
    };
    let (timestamp, text) = line.split_once(':').ok_or_else(malformed)?;
    let timestamp: f64 = timestamp.trim().parse().map_err(|_| malformed())?;
    if timestamp < 0.0 {
        return Err(malformed());
    }
    let text = text.trim();
    if text.is_empty() {
        return Err(malformed());
    }
    Ok(CaptionEvent::new(timestamp, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_two_decimal_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.txt");
        let timeline = Timeline::from_events(vec![
            CaptionEvent::new(0.0, "HELLO WORLD"),
            CaptionEvent::new(3.3333, "GOODBYE NOW"),
        ]);
        save_timeline(&timeline, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "0.00: HELLO WORLD\n3.33: GOODBYE NOW\n");
    }

    #[test]
    fn round_trip_keeps_order_and_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.txt");
        let timeline = Timeline::from_events(vec![
            CaptionEvent::new(1.25, "first caption"),
            CaptionEvent::new(4.5, "second: with a colon"),
        ]);
        save_timeline(&timeline, &path).unwrap();
        let loaded = load_timeline(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.events()[0].timestamp_secs, 1.25);
        // Only the first colon separates timestamp and text.
        assert_eq!(loaded.events()[1].text, "second: with a colon");
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.txt");
        fs::write(
            &path,
            "0.00: first\nnot_a_timestamp_no_colon\nabc: second\n2.00: third\n",
        )
        .unwrap();
        let loaded = load_timeline(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.events()[0].text, "first");
        assert_eq!(loaded.events()[1].text, "third");
    }

    #[test]
    fn negative_timestamps_and_empty_text_are_malformed() {
        assert!(parse_line(1, "-1.0: text").is_err());
        assert!(parse_line(1, "1.0:   ").is_err());
        assert!(parse_line(1, "1.0: ok").is_ok());
    }

    #[test]
    fn malformed_line_error_carries_position_and_content() {
        let err = parse_line(7, "abc: second").unwrap_err();
        match &err {
            CapvoiceError::MalformedTimelineLine { line, content } => {
                assert_eq!(*line, 7);
                assert_eq!(content, "abc: second");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.to_string(), "malformed timeline line 7: abc: second");
    }
}
