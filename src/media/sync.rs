//! Audio reconstruction: synthesize each caption and assemble one continuous
//! track whose segments start at the caption timestamps.
//!
//! Synthesis runs with bounded concurrency and the results are re-ordered by
//! timeline position before assembly, which itself is strictly sequential:
//! the silence inserted before and after a clip depends on the running track
//! duration and the next caption's timestamp.

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::config::{OverrunPolicy, PipelineConfig};
use crate::error::{CapvoiceError, Result};
use crate::subtitle::Timeline;
use crate::tts::{SpeechSynthesizer, SynthesizedClip};
use crate::CancelToken;

use super::audio::{decode_clip, AudioTrack};

/// Synthesizes and decodes a clip for every event in the timeline.
///
/// Runs at most `max_concurrent_requests` synthesis calls at once. Per-event
/// failures (request error, timeout, undecodable audio) are logged and the
/// event is dropped; the returned clips are sorted back into timeline order.
pub async fn synthesize_clips(
    timeline: &Timeline,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> Result<Vec<SynthesizedClip>> {
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_requests.max(1)));
    let request_timeout = config.request_timeout();
    let mut tasks = Vec::with_capacity(timeline.len());

    for (index, event) in timeline.iter().cloned().enumerate() {
        let synthesizer = synthesizer.clone();
        let semaphore = semaphore.clone();
        let cancel = cancel.clone();

        tasks.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return None;
            };
            if cancel.is_cancelled() {
                return None;
            }

            let encoded = match timeout(request_timeout, synthesizer.synthesize(&event.text)).await
            {
                Ok(Ok(bytes)) => bytes,
                Ok(Err(e)) => {
                    warn!("Synthesis failed for caption '{}': {}", event.text, e);
                    return None;
                }
                Err(_) => {
                    warn!("Synthesis timed out for caption '{}'", event.text);
                    return None;
                }
            };

            match decode_clip(&encoded) {
                Ok((samples, sample_rate)) => Some(SynthesizedClip {
                    index,
                    event,
                    encoded,
                    samples,
                    sample_rate,
                }),
                Err(e) => {
                    warn!("Undecodable clip for caption '{}': {}", event.text, e);
                    None
                }
            }
        }));
    }

    let mut clips: Vec<SynthesizedClip> = join_all(tasks)
        .await
        .into_iter()
        .filter_map(|r| r.ok().flatten())
        .collect();
    clips.sort_by_key(|c| c.index);

    if cancel.is_cancelled() {
        return Err(CapvoiceError::Cancelled);
    }

    info!(
        "Synthesized {}/{} caption clips",
        clips.len(),
        timeline.len()
    );
    Ok(clips)
}

/// Assembles clips into one continuous track with silence padding.
///
/// For each clip: leading silence up to the caption timestamp, the clip
/// itself, then trailing silence sized so the next caption's own leading
/// silence starts near its timestamp even though clip durations rarely
/// match the gaps between captions. No trailing silence is added after the
/// last clip. A clip whose timestamp is already in the past is handled per
/// the overrun policy: drift (append immediately, track runs late from then
/// on) or truncate the overrunning audio.
pub fn assemble_track(
    clips: &[SynthesizedClip],
    sample_rate: u32,
    policy: OverrunPolicy,
) -> AudioTrack {
    let mut track = AudioTrack::new(sample_rate);

    for (pos, clip) in clips.iter().enumerate() {
        if clip.sample_rate != sample_rate {
            warn!(
                "Skipping clip for caption '{}': sample rate {} does not match track rate {}",
                clip.event.text, clip.sample_rate, sample_rate
            );
            continue;
        }

        let target_ms = clip.event.timestamp_ms();
        let elapsed = track.duration_ms();
        let lead = target_ms - elapsed;
        if lead > 0 {
            track.append_silence_ms(lead);
        } else if lead < 0 {
            match policy {
                OverrunPolicy::Drift => {
                    debug!(
                        "Caption at {}ms starts {}ms late; track drifts from here",
                        target_ms, -lead
                    );
                }
                OverrunPolicy::Truncate => {
                    track.truncate_to_ms(target_ms);
                }
            }
        }

        track.append_samples(&clip.samples);

        // Stretch toward the next caption's timestamp. The gap is computed
        // from the caption timestamps and the clip duration, not from the
        // possibly-drifted track position.
        if let Some(next) = clips.get(pos + 1) {
            let gap = next.event.timestamp_ms() - target_ms - clip.duration_ms();
            if gap > 0 {
                track.append_silence_ms(gap);
            }
        }
    }

    track
}

/// Synthesizes the timeline and assembles the continuous audio track.
///
/// Also writes one encoded clip file per surviving event into `output_dir`,
/// named `segment_<n>.mp3` by the event's 1-based position in the cleaned
/// timeline.
pub async fn reconstruct_audio(
    timeline: &Timeline,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    config: &PipelineConfig,
    output_dir: &Path,
    cancel: &CancelToken,
) -> Result<AudioTrack> {
    let clips = synthesize_clips(timeline, synthesizer, config, cancel).await?;

    for clip in &clips {
        let path = output_dir.join(format!("segment_{}.mp3", clip.index + 1));
        tokio::fs::write(&path, &clip.encoded).await?;
        debug!("Saved clip audio to {}", path.display());
    }

    let track = assemble_track(&clips, config.sample_rate, config.overrun_policy);
    info!(
        "Assembled {}ms audio track from {} clips",
        track.duration_ms(),
        clips.len()
    );
    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::CaptionEvent;
    use async_trait::async_trait;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::io::Cursor;

    fn clip(index: usize, at_secs: f64, duration_ms: usize, rate: u32) -> SynthesizedClip {
        SynthesizedClip {
            index,
            event: CaptionEvent::new(at_secs, format!("caption {index}")),
            encoded: Vec::new(),
            samples: vec![0.5; duration_ms * rate as usize / 1000],
            sample_rate: rate,
        }
    }

    #[test]
    fn pads_leading_and_trailing_silence() {
        // Caption at t=2.0 with a 500ms clip, next caption at t=3.0:
        // 2000ms silence + 500ms clip + 500ms gap silence = 3000ms elapsed,
        // so the next caption starts exactly on time.
        let clips = vec![clip(0, 2.0, 500, 1000), clip(1, 3.0, 400, 1000)];
        let track = assemble_track(&clips, 1000, OverrunPolicy::Drift);
        assert_eq!(track.duration_ms(), 3400);
        // Silence regions really are silent and speech regions are not.
        assert_eq!(track.samples()[1999], 0.0);
        assert_ne!(track.samples()[2000], 0.0);
        assert_eq!(track.samples()[2500], 0.0);
        assert_ne!(track.samples()[3000], 0.0);
    }

    #[test]
    fn no_trailing_silence_after_last_clip() {
        let clips = vec![clip(0, 1.0, 250, 1000)];
        let track = assemble_track(&clips, 1000, OverrunPolicy::Drift);
        assert_eq!(track.duration_ms(), 1250);
    }

    #[test]
    fn overrun_drifts_by_default() {
        // First clip overruns its slot by 500ms; the second clip is
        // appended immediately and the track runs late from then on.
        let clips = vec![clip(0, 0.0, 1500, 1000), clip(1, 1.0, 200, 1000)];
        let track = assemble_track(&clips, 1000, OverrunPolicy::Drift);
        assert_eq!(track.duration_ms(), 1700);
    }

    #[test]
    fn overrun_truncate_restores_timing() {
        let clips = vec![clip(0, 0.0, 1500, 1000), clip(1, 1.0, 200, 1000)];
        let track = assemble_track(&clips, 1000, OverrunPolicy::Truncate);
        // The overrunning clip is cut at 1000ms, then the 200ms clip plays.
        assert_eq!(track.duration_ms(), 1200);
    }

    #[test]
    fn mismatched_sample_rate_clips_are_skipped() {
        let clips = vec![clip(0, 0.0, 500, 44_100), clip(1, 1.0, 200, 1000)];
        let track = assemble_track(&clips, 1000, OverrunPolicy::Drift);
        assert_eq!(track.duration_ms(), 1200);
    }

    /// Synthesizer that renders a fixed-length in-memory WAV per caption,
    /// failing on captions containing "fail".
    struct WavSynthesizer {
        rate: u32,
        duration_ms: usize,
    }

    #[async_trait]
    impl SpeechSynthesizer for WavSynthesizer {
        async fn synthesize(&self, text: &str) -> crate::error::Result<Vec<u8>> {
            if text.contains("fail") {
                return Err(CapvoiceError::SynthesisUnavailable("mock failure".into()));
            }
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

    #[tokio::test]
    async fn synthesis_failures_drop_only_that_event() {
        let timeline = Timeline::from_events(vec![
            CaptionEvent::new(0.0, "hello world"),
            CaptionEvent::new(2.0, "please fail here"),
            CaptionEvent::new(4.0, "goodbye now"),
        ]);
        let synth = Arc::new(WavSynthesizer {
            rate: 8000,
            duration_ms: 500,
        });
        let config = PipelineConfig {
            sample_rate: 8000,
            ..PipelineConfig::default()
        };
        let clips = synthesize_clips(&timeline, synth, &config, &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(clips.len(), 2);
        assert_eq!(clips[0].index, 0);
        assert_eq!(clips[1].index, 2);
        assert_eq!(clips[0].duration_ms(), 500);
    }

    #[tokio::test]
    async fn reconstruct_writes_segment_files_and_track() {
        let dir = tempfile::tempdir().unwrap();
        let timeline = Timeline::from_events(vec![
            CaptionEvent::new(1.0, "hello world"),
            CaptionEvent::new(3.0, "goodbye now"),
        ]);
        let synth = Arc::new(WavSynthesizer {
            rate: 8000,
            duration_ms: 500,
        });
        let config = PipelineConfig {
            sample_rate: 8000,
            ..PipelineConfig::default()
        };
        let track = reconstruct_audio(&timeline, synth, &config, dir.path(), &CancelToken::new())
            .await
            .unwrap();
        // 1000ms lead + 500ms clip + 1500ms gap + 500ms clip.
        assert_eq!(track.duration_ms(), 3500);
        assert!(dir.path().join("segment_1.mp3").exists());
        assert!(dir.path().join("segment_2.mp3").exists());
    }

    #[tokio::test]
    async fn cancelled_synthesis_returns_cancelled() {
        let timeline = Timeline::from_events(vec![CaptionEvent::new(0.0, "hello")]);
        let synth = Arc::new(WavSynthesizer {
            rate: 8000,
            duration_ms: 100,
        });
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = synthesize_clips(&timeline, synth, &PipelineConfig::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, CapvoiceError::Cancelled));
    }
}
