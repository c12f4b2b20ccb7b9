//! capvoice turns a silent or differently-voiced video into one whose audio
//! track narrates the on-screen captions.
//!
//! The pipeline runs in strict stages: frames are sampled and OCR'd into a
//! deduplicated caption timeline, the timeline is filtered and cleaned, and
//! the cleaned captions are synthesized into speech clips that are assembled
//! into a single continuous audio track aligned to the caption timestamps.
//! Each stage drains completely before the next starts: cross-event dedup
//! needs the whole timeline, and silence padding needs every event's
//! neighbor.

pub mod cleanup;
pub mod config;
pub mod error;
pub mod media;
pub mod ocr;
pub mod progress;
pub mod subtitle;
pub mod tts;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};

pub use config::{OverrunPolicy, PipelineConfig, TtsModel, TtsVoice};
pub use error::{CapvoiceError, Result};
pub use progress::{LogReporter, ProgressReporter, Stage};
pub use subtitle::{CaptionEvent, Timeline};

use cleanup::TextCleaner;
use media::frames::{FfmpegFrameSource, FrameSource};
use ocr::TextRecognizer;
use subtitle::{DriftGuard, ValidityFilter, Wordlist};
use tts::SpeechSynthesizer;

/// Cooperative cancellation flag, checked between frames and events, never
/// mid network call. Cancelling leaves partial in-memory output discardable;
/// nothing half-written ever reaches disk.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Paths and counts produced by a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Events extracted before cleaning.
    pub extracted_events: usize,
    /// Events that survived the text pipeline.
    pub cleaned_events: usize,
    /// Persisted raw timeline.
    pub timeline_path: PathBuf,
    /// Persisted cleaned timeline.
    pub cleaned_timeline_path: PathBuf,
    /// Reconstructed audio track.
    pub audio_path: PathBuf,
    /// Muxed video, when muxing was enabled and there was audio to mux.
    pub video_path: Option<PathBuf>,
}

/// The caption-to-voiceover pipeline.
///
/// Owns the configuration and the three external services. The frame source
/// is opened per run and owned exclusively by the extraction stage; all
/// stage hand-offs are by value.
pub struct Pipeline {
    config: PipelineConfig,
    recognizer: Arc<dyn TextRecognizer>,
    cleaner: Arc<dyn TextCleaner>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    filter: ValidityFilter,
    guard: DriftGuard,
    reporter: Arc<dyn ProgressReporter>,
    cancel: CancelToken,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        wordlist: Wordlist,
        recognizer: Arc<dyn TextRecognizer>,
        cleaner: Arc<dyn TextCleaner>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let filter = ValidityFilter::new(wordlist, config.whitelist.clone());
        Self {
            config,
            recognizer,
            cleaner,
            synthesizer,
            filter,
            guard: DriftGuard::default(),
            reporter: Arc::new(LogReporter),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Token that cancels this pipeline's current and future runs.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs the full pipeline on `video`, writing all outputs under
    /// `output_dir`.
    pub async fn run(&self, video: &Path, output_dir: &Path) -> Result<RunSummary> {
        let mut source = FfmpegFrameSource::open(video, self.config.frame_stride)?;
        self.run_with_source(&mut source, video, output_dir).await
    }

    /// Runs the pipeline against an already-opened frame source. The mux
    /// stage still reads `video` from disk when enabled.
    pub async fn run_with_source(
        &self,
        source: &mut dyn FrameSource,
        video: &Path,
        output_dir: &Path,
    ) -> Result<RunSummary> {
        // Output-path failures are fatal up front; nothing else is written
        // until each stage's state is fully validated in memory.
        std::fs::create_dir_all(output_dir).map_err(|e| {
            CapvoiceError::Configuration(format!(
                "cannot create output directory {}: {}",
                output_dir.display(),
                e
            ))
        })?;

        // 1. Timeline extraction.
        self.reporter.stage_started(Stage::TimelineExtraction);
        let timeline =
            subtitle::extract_timeline(source, self.recognizer.as_ref(), &self.config, &self.cancel)
                .await?;
        let timeline_path = output_dir.join("extracted_subtitles.txt");
        subtitle::store::save_timeline(&timeline, &timeline_path)?;
        self.reporter.stage_completed(Stage::TimelineExtraction);

        // 2. Text pipeline.
        self.reporter.stage_started(Stage::TextCleaning);
        let (cleaned, stats) = subtitle::clean_timeline(
            &timeline,
            self.cleaner.as_ref(),
            &self.filter,
            &self.guard,
            self.config.request_timeout(),
            &self.cancel,
        )
        .await?;
        let cleaned_timeline_path = output_dir.join("cleaned_subtitles.txt");
        subtitle::store::save_timeline(&cleaned, &cleaned_timeline_path)?;
        self.reporter
            .stage_progress(Stage::TextCleaning, stats.kept, timeline.len());
        self.reporter.stage_completed(Stage::TextCleaning);

        // 3. Synthesis and track assembly.
        self.reporter.stage_started(Stage::SpeechSynthesis);
        let track = media::reconstruct_audio(
            &cleaned,
            self.synthesizer.clone(),
            &self.config,
            output_dir,
            &self.cancel,
        )
        .await?;
        self.reporter.stage_completed(Stage::SpeechSynthesis);

        self.reporter.stage_started(Stage::AudioAssembly);
        let audio_path = output_dir.join("voiceover.wav");
        track.write_wav(&audio_path)?;
        self.reporter.stage_completed(Stage::AudioAssembly);

        // 4. Mux the new track back into the video.
        let video_path = if self.config.mux_output && !track.is_empty() {
            self.reporter.stage_started(Stage::Muxing);
            let stem = video
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            let muxed = output_dir.join(format!("{}_voiced.mp4", stem));
            let path = media::video::replace_audio(video, &audio_path, &muxed).await?;
            self.reporter.stage_completed(Stage::Muxing);
            Some(path)
        } else {
            if self.config.mux_output {
                warn!("No audio was reconstructed; skipping mux");
            }
            None
        };

        info!(
            "Run complete: {} events extracted, {} kept after cleaning",
            timeline.len(),
            cleaned.len()
        );
        Ok(RunSummary {
            extracted_events: timeline.len(),
            cleaned_events: cleaned.len(),
            timeline_path,
            cleaned_timeline_path,
            audio_path,
            video_path,
        })
    }
}
