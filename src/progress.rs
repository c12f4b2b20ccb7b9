//! Progress reporting for pipeline runs.
//!
//! The pipeline reports stage transitions and per-stage item counts through a
//! [`ProgressReporter`]. The default reporter forwards everything to the log.

/// Stages of a caption-to-voiceover run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Sampling frames and recognizing on-screen text.
    TimelineExtraction,
    /// Filtering, cleanup and deduplication of the timeline.
    TextCleaning,
    /// Per-caption speech synthesis.
    SpeechSynthesis,
    /// Assembling the continuous audio track.
    AudioAssembly,
    /// Replacing the video's audio track.
    Muxing,
}

impl Stage {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::TimelineExtraction => "extracting caption timeline",
            Self::TextCleaning => "cleaning caption text",
            Self::SpeechSynthesis => "synthesizing speech",
            Self::AudioAssembly => "assembling audio track",
            Self::Muxing => "muxing audio into video",
        }
    }
}

/// Observer of pipeline progress.
pub trait ProgressReporter: Send + Sync {
    fn stage_started(&self, stage: Stage);

    fn stage_progress(&self, _stage: Stage, _done: usize, _total: usize) {}

    fn stage_completed(&self, stage: Stage);
}

/// Reporter that writes stage transitions to the log.
#[derive(Debug, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn stage_started(&self, stage: Stage) {
        log::info!("Stage started: {}", stage.describe());
    }

    fn stage_progress(&self, stage: Stage, done: usize, total: usize) {
        log::debug!("{}: {}/{}", stage.describe(), done, total);
    }

    fn stage_completed(&self, stage: Stage) {
        log::info!("Stage completed: {}", stage.describe());
    }
}
