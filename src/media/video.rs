//! Muxing: replace a video's audio track with the reconstructed voiceover.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::{error, info};
use tokio::process::Command;

use crate::error::{CapvoiceError, Result};

/// Replaces the audio track of `video` with `audio`, writing to `output`.
///
/// The video stream is copied as-is; the audio is encoded to AAC. Requires
/// ffmpeg on the PATH.
pub async fn replace_audio(video: &Path, audio: &Path, output: &Path) -> Result<PathBuf> {
    let args = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-y",
    ];
    info!(
        "Muxing {} into {} -> {}",
        audio.display(),
        video.display(),
        output.display()
    );

    let status = Command::new("ffmpeg")
        .args(args)
        .arg("-i")
        .arg(video)
        .arg("-i")
        .arg(audio)
        .args([
            "-map", "0:v:0",
            "-map", "1:a:0",
            "-c:v", "copy",
            "-c:a", "aac",
            "-b:a", "192k",
            "-shortest",
        ])
        .arg(output)
        .stdout(Stdio::null())
        .status()
        .await
        .map_err(|e| CapvoiceError::VideoProcessing(format!("failed to run ffmpeg: {}", e)))?;

    if !status.success() {
        error!("ffmpeg mux failed with status {}", status);
        return Err(CapvoiceError::VideoProcessing(format!(
            "ffmpeg mux failed with status {}",
            status
        )));
    }

    info!("Video with new audio saved to {}", output.display());
    Ok(output.to_path_buf())
}
