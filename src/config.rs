//! Pipeline configuration.

use serde::{Deserialize, Serialize};

/// TTS model used with the OpenAI speech endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TtsModel {
    /// Standard quality model.
    Standard,
    /// High definition model.
    HighDefinition,
}

impl Default for TtsModel {
    fn default() -> Self {
        Self::Standard
    }
}

impl TtsModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "tts-1",
            Self::HighDefinition => "tts-1-hd",
        }
    }
}

/// Voice used with the OpenAI speech endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TtsVoice {
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl Default for TtsVoice {
    fn default() -> Self {
        Self::Nova
    }
}

impl TtsVoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Echo => "echo",
            Self::Fable => "fable",
            Self::Onyx => "onyx",
            Self::Nova => "nova",
            Self::Shimmer => "shimmer",
        }
    }
}

/// What to do when a synthesized clip overruns the slot before the next
/// caption, so the next clip's timestamp is already in the past.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OverrunPolicy {
    /// Append the late clip immediately and let the track drift later than
    /// the caption timestamps from that point on.
    Drift,
    /// Truncate the overrunning audio so the late clip starts exactly at its
    /// caption timestamp.
    Truncate,
}

impl Default for OverrunPolicy {
    fn default() -> Self {
        Self::Drift
    }
}

/// Configuration for a full caption-to-voiceover run.
///
/// Service credentials are not part of the config: the recognizer, cleaner
/// and synthesizer are constructed with their keys and handed to the
/// pipeline, the same way the wordlist is loaded once and injected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Sample every Nth video frame for text recognition.
    pub frame_stride: u64,
    /// Override the frame rate probed from the video.
    pub fps_override: Option<f64>,
    /// TTS model.
    pub tts_model: TtsModel,
    /// TTS voice.
    pub tts_voice: TtsVoice,
    /// Chat model used for subtitle cleanup.
    pub cleanup_model: String,
    /// Maximum number of concurrent synthesis requests.
    pub max_concurrent_requests: usize,
    /// Timeout for a single external service call, in seconds.
    pub request_timeout_secs: u64,
    /// Known-good short captions that bypass the validity rules.
    pub whitelist: Vec<String>,
    /// Behaviour when a clip overruns its slot.
    pub overrun_policy: OverrunPolicy,
    /// Sample rate of the reconstructed audio track.
    pub sample_rate: u32,
    /// Mux the reconstructed track back into the source video.
    pub mux_output: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_stride: 30,
            fps_override: None,
            tts_model: TtsModel::default(),
            tts_voice: TtsVoice::default(),
            cleanup_model: "gpt-3.5-turbo".to_string(),
            max_concurrent_requests: 5,
            request_timeout_secs: 30,
            whitelist: vec!["At Onigashima".to_string()],
            overrun_policy: OverrunPolicy::default(),
            sample_rate: 24_000,
            mux_output: true,
        }
    }
}

impl PipelineConfig {
    /// Timeout applied to every single external service call.
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}
