//! In-memory audio: clip decoding, the track buffer and WAV output.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::warn;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{CapvoiceError, Result};

/// Decodes an encoded audio clip (MP3 or WAV) into mono f32 samples.
///
/// Multi-channel clips are downmixed by averaging. Returns the samples and
/// their sample rate.
pub fn decode_clip(bytes: &[u8]) -> Result<(Vec<f32>, u32)> {
    let stream = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| CapvoiceError::AudioProcessing(format!("unsupported clip format: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| CapvoiceError::AudioProcessing("clip has no audio track".to_string()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| CapvoiceError::AudioProcessing(format!("unsupported codec: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut buffer: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(CapvoiceError::AudioProcessing(format!(
                    "failed to read clip packet: {}",
                    e
                )))
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping undecodable clip packet: {}", e);
                continue;
            }
            Err(e) => {
                return Err(CapvoiceError::AudioProcessing(format!(
                    "clip decode failed: {}",
                    e
                )))
            }
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        let channels = spec.channels.count();
        if buffer.is_none() {
            buffer = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = buffer.as_mut() {
            buf.copy_interleaved_ref(decoded);
            if channels <= 1 {
                samples.extend_from_slice(buf.samples());
            } else {
                for frame in buf.samples().chunks_exact(channels) {
                    samples.push(frame.iter().sum::<f32>() / channels as f32);
                }
            }
        }
    }

    if samples.is_empty() || sample_rate == 0 {
        return Err(CapvoiceError::AudioProcessing(
            "clip decoded to no samples".to_string(),
        ));
    }
    Ok((samples, sample_rate))
}

/// A single continuous mono audio buffer under construction.
///
/// The track only ever grows during normal assembly; truncation exists
/// solely for the explicit overrun policy.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    sample_rate: u32,
    samples: Vec<f32>,
}

impl AudioTrack {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Cumulative playback duration in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        self.samples.len() as i64 * 1000 / self.sample_rate as i64
    }

    /// Appends silence. Non-positive durations append nothing.
    pub fn append_silence_ms(&mut self, ms: i64) {
        if ms <= 0 {
            return;
        }
        let count = (ms as u64 * self.sample_rate as u64 / 1000) as usize;
        self.samples.resize(self.samples.len() + count, 0.0);
    }

    pub fn append_samples(&mut self, samples: &[f32]) {
        self.samples.extend_from_slice(samples);
    }

    /// Cuts the track back to `ms` if it is currently longer.
    pub fn truncate_to_ms(&mut self, ms: i64) {
        if ms < 0 {
            return;
        }
        let keep = (ms as u64 * self.sample_rate as u64 / 1000) as usize;
        if keep < self.samples.len() {
            self.samples.truncate(keep);
        }
    }

    /// Writes the track as 16-bit PCM mono WAV.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec)
            .map_err(|e| CapvoiceError::AudioProcessing(format!("failed to create WAV: {}", e)))?;
        for sample in &self.samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(value)
                .map_err(|e| CapvoiceError::AudioProcessing(format!("failed to write WAV: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| CapvoiceError::AudioProcessing(format!("failed to finalize WAV: {}", e)))?;
        Ok(())
    }
}
