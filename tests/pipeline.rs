//! End-to-end pipeline tests with in-memory service implementations.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};

use capvoice::cleanup::TextCleaner;
use capvoice::error::{CapvoiceError, Result};
use capvoice::media::{FrameSource, SampledFrame};
use capvoice::ocr::TextRecognizer;
use capvoice::subtitle::Wordlist;
use capvoice::tts::SpeechSynthesizer;
use capvoice::{Pipeline, PipelineConfig};

/// Frame source whose "images" are the caption text as UTF-8 bytes.
struct MemoryFrames {
    fps: f64,
    frames: Vec<(u64, &'static str)>,
    cursor: usize,
}

impl MemoryFrames {
    fn new(fps: f64, frames: Vec<(u64, &'static str)>) -> Self {
        Self {
            fps,
            frames,
            cursor: 0,
        }
    }
}

impl FrameSource for MemoryFrames {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn next_frame(&mut self) -> Result<Option<SampledFrame>> {
        let Some((index, text)) = self.frames.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        Ok(Some(SampledFrame {
            index: *index,
            image: text.as_bytes().to_vec(),
        }))
    }
}

/// Recognizer that reads the caption straight out of the fake image bytes.
struct EchoRecognizer;

#[async_trait]
impl TextRecognizer for EchoRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<Option<String>> {
        let text = String::from_utf8_lossy(image).trim().to_string();
        if text == "ERR" {
            return Err(CapvoiceError::RecognitionUnavailable("mock outage".into()));
        }
        Ok((!text.is_empty()).then_some(text))
    }
}

/// Cleaner that lowercases captions, refusing ones containing "refuse".
struct LowercaseCleaner;

#[async_trait]
impl TextCleaner for LowercaseCleaner {
    async fn clean(&self, text: &str) -> Result<String> {
        if text.contains("refuse") {
            return Ok("I'm ready to help further.".to_string());
        }
        Ok(text.to_lowercase())
    }
}

/// Synthesizer producing a fixed-length in-memory WAV per caption.
struct WavSynthesizer {
    rate: u32,
    duration_ms: usize,
}

#[async_trait]
impl SpeechSynthesizer for WavSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..(self.duration_ms * self.rate as usize / 1000) {
                writer.write_sample(8000i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        Ok(cursor.into_inner())
    }
}

fn pipeline() -> Pipeline {
    let config = PipelineConfig {
        sample_rate: 8000,
        mux_output: false,
        ..PipelineConfig::default()
    };
    let wordlist = Wordlist::from_words(["hello", "world", "goodbye", "now", "please"]);
    Pipeline::new(
        config,
        wordlist,
        Arc::new(EchoRecognizer),
        Arc::new(LowercaseCleaner),
        Arc::new(WavSynthesizer {
            rate: 8000,
            duration_ms: 500,
        }),
    )
}

#[tokio::test]
async fn full_run_produces_timelines_and_audio() {
    let dir = tempfile::tempdir().unwrap();
    let mut frames = MemoryFrames::new(
        30.0,
        vec![
            (0, "HELLO WORLD"),
            (30, "HELLO WORLD"),
            (60, ""),
            (90, "GOODBYE NOW"),
        ],
    );

    let summary = pipeline()
        .run_with_source(&mut frames, dir.path().join("in.mp4").as_path(), dir.path())
        .await
        .unwrap();

    assert_eq!(summary.extracted_events, 2);
    assert_eq!(summary.cleaned_events, 2);

    let raw = std::fs::read_to_string(&summary.timeline_path).unwrap();
    assert_eq!(raw, "0.00: HELLO WORLD\n3.00: GOODBYE NOW\n");

    let cleaned = std::fs::read_to_string(&summary.cleaned_timeline_path).unwrap();
    assert_eq!(cleaned, "0.00: hello world\n3.00: goodbye now\n");

    // 500ms clip at t=0, 2500ms gap silence, 500ms clip at t=3.0.
    let reader = hound::WavReader::open(&summary.audio_path).unwrap();
    assert_eq!(reader.spec().sample_rate, 8000);
    assert_eq!(reader.len(), 3500 * 8);

    assert!(dir.path().join("segment_1.mp3").exists());
    assert!(dir.path().join("segment_2.mp3").exists());
    assert!(summary.video_path.is_none());
}

#[tokio::test]
async fn recognition_outage_drops_only_that_frame() {
    let dir = tempfile::tempdir().unwrap();
    let mut frames = MemoryFrames::new(
        30.0,
        vec![(0, "HELLO WORLD"), (30, "ERR"), (60, "GOODBYE NOW")],
    );

    let summary = pipeline()
        .run_with_source(&mut frames, dir.path().join("in.mp4").as_path(), dir.path())
        .await
        .unwrap();
    assert_eq!(summary.extracted_events, 2);
}

#[tokio::test]
async fn refused_cleanups_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let mut frames = MemoryFrames::new(
        30.0,
        vec![(0, "please refuse now"), (30, "HELLO WORLD")],
    );

    let summary = pipeline()
        .run_with_source(&mut frames, dir.path().join("in.mp4").as_path(), dir.path())
        .await
        .unwrap();
    assert_eq!(summary.extracted_events, 2);
    assert_eq!(summary.cleaned_events, 1);

    let cleaned = std::fs::read_to_string(&summary.cleaned_timeline_path).unwrap();
    assert_eq!(cleaned, "1.00: hello world\n");
}

#[tokio::test]
async fn cancelled_run_stops_between_frames() {
    let dir = tempfile::tempdir().unwrap();
    let mut frames = MemoryFrames::new(30.0, vec![(0, "HELLO WORLD")]);

    let pipeline = pipeline();
    pipeline.cancel_token().cancel();
    let err = pipeline
        .run_with_source(&mut frames, dir.path().join("in.mp4").as_path(), dir.path())
        .await
        .unwrap_err();
    assert!(matches!(err, CapvoiceError::Cancelled));
}
