//! Sampled frame access to a video source.
//!
//! The production implementation shells out to ffmpeg to dump every Nth
//! frame as a JPEG into a temporary directory, then yields the images in
//! order. The source is finite and forward-only; the extractor owns it
//! exclusively for the duration of its pass.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};
use tempfile::TempDir;

use crate::error::{CapvoiceError, Result};

/// One sampled video frame.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// Index of the frame in the source video.
    pub index: u64,
    /// Encoded image bytes (JPEG for the ffmpeg source).
    pub image: Vec<u8>,
}

/// Lazy, finite, forward-only sequence of sampled frames.
pub trait FrameSource: Send {
    /// Frames per second of the underlying video.
    fn fps(&self) -> f64;

    /// The next sampled frame, or `None` when the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<SampledFrame>>;
}

/// Frame source that samples a video file with ffmpeg.
#[derive(Debug)]
pub struct FfmpegFrameSource {
    fps: f64,
    stride: u64,
    frame_paths: Vec<PathBuf>,
    cursor: usize,
    // Keeps the dumped frames alive until the source is dropped.
    _workdir: TempDir,
}

impl FfmpegFrameSource {
    /// Opens `video` and dumps every `stride`-th frame.
    ///
    /// Any failure here (missing file, missing tools, ffmpeg error) is fatal
    /// to the run and maps to [`CapvoiceError::SourceUnavailable`].
    pub fn open(video: &Path, stride: u64) -> Result<Self> {
        if stride == 0 {
            return Err(CapvoiceError::Configuration(
                "frame stride must be at least 1".to_string(),
            ));
        }
        if !video.exists() {
            return Err(CapvoiceError::SourceUnavailable(format!(
                "no such file: {}",
                video.display()
            )));
        }

        let fps = probe_fps(video)?;
        let workdir = tempfile::tempdir()
            .map_err(|e| CapvoiceError::SourceUnavailable(e.to_string()))?;
        let pattern = workdir.path().join("frame_%06d.jpg");

        let select = format!(r"select=not(mod(n\,{}))", stride);
        info!(
            "Sampling every {}th frame of {} at {:.3} fps",
            stride,
            video.display(),
            fps
        );
        let status = Command::new("ffmpeg")
            .args([
                "-hide_banner",
                "-loglevel",
                "error",
                "-i",
            ])
            .arg(video)
            .args(["-vf", &select, "-vsync", "vfr", "-q:v", "2"])
            .arg(&pattern)
            .status()
            .map_err(|e| {
                CapvoiceError::SourceUnavailable(format!("failed to run ffmpeg: {}", e))
            })?;
        if !status.success() {
            return Err(CapvoiceError::SourceUnavailable(format!(
                "ffmpeg frame sampling failed with status {}",
                status
            )));
        }

        let mut frame_paths: Vec<PathBuf> = fs::read_dir(workdir.path())
            .map_err(|e| CapvoiceError::SourceUnavailable(e.to_string()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("jpg"))
            .collect();
        frame_paths.sort();
        debug!("Sampled {} frames", frame_paths.len());

        Ok(Self {
            fps,
            stride,
            frame_paths,
            cursor: 0,
            _workdir: workdir,
        })
    }
}

impl FrameSource for FfmpegFrameSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn next_frame(&mut self) -> Result<Option<SampledFrame>> {
        let Some(path) = self.frame_paths.get(self.cursor) else {
            return Ok(None);
        };
        let image = fs::read(path)?;
        // ffmpeg numbers dumped frames 1..N in sampling order; the Nth
        // sampled frame is source frame (N-1) * stride.
        let index = self.cursor as u64 * self.stride;
        self.cursor += 1;
        Ok(Some(SampledFrame { index, image }))
    }
}

/// Probes the average frame rate of the first video stream with ffprobe.
fn probe_fps(video: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=r_frame_rate",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(video)
        .output()
        .map_err(|e| CapvoiceError::SourceUnavailable(format!("failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(CapvoiceError::SourceUnavailable(format!(
            "ffprobe failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    parse_frame_rate(raw.trim()).ok_or_else(|| {
        CapvoiceError::SourceUnavailable(format!("unparsable frame rate: {}", raw.trim()))
    })
}

/// Parses an ffprobe rational frame rate such as "30000/1001" or "25/1".
fn parse_frame_rate(raw: &str) -> Option<f64> {
    match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 || num <= 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => {
            let fps: f64 = raw.trim().parse().ok()?;
            (fps > 0.0).then_some(fps)
        }
    }
}
