//! Frame sampling, audio decoding, track assembly and muxing.

pub mod audio;
pub mod frames;
pub mod sync;
pub mod video;

pub use audio::AudioTrack;
pub use frames::{FfmpegFrameSource, FrameSource, SampledFrame};
pub use sync::reconstruct_audio;
