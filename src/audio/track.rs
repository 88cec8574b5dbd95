//! Finite mono sample buffer with WAV I/O.

use crate::defaults::SAMPLE_RATE;
use crate::error::{DubError, Result};
use std::path::Path;

/// A finite-duration mono audio buffer at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl AudioTrack {
    /// Creates a track from raw samples.
    pub fn from_samples(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Creates a silent track of the given duration.
    pub fn silent(duration_secs: f64, sample_rate: u32) -> Self {
        let len = (duration_secs * sample_rate as f64).round() as usize;
        Self {
            samples: vec![0; len],
            sample_rate,
        }
    }

    /// Reads a WAV file, downmixing to mono and resampling to the engine's
    /// internal rate when the file differs.
    pub fn from_wav(path: &Path) -> Result<Self> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let raw: Vec<i16> = match spec.sample_format {
            hound::SampleFormat::Int => {
                reader.samples::<i16>().collect::<std::result::Result<
                    Vec<_>,
                    _,
                >>()?
            }
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };

        let mono = if spec.channels > 1 {
            let channels = spec.channels as usize;
            raw.chunks_exact(channels)
                .map(|frame| {
                    let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                    (sum / channels as i32) as i16
                })
                .collect()
        } else {
            raw
        };

        let samples = if spec.sample_rate != SAMPLE_RATE {
            resample(&mono, spec.sample_rate, SAMPLE_RATE)
        } else {
            mono
        };

        Ok(Self {
            samples,
            sample_rate: SAMPLE_RATE,
        })
    }

    /// Writes the track as a 16-bit mono WAV file.
    pub fn to_wav(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the track holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Raw sample access.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Additively overlays `clip` starting at `offset` samples.
    ///
    /// Overlay, not replace: existing content and the clip sum with
    /// saturation. Clip samples past the end of this track are dropped —
    /// the timeline's trailing pad exists so that only pathological
    /// overruns hit the boundary.
    pub fn overlay_at(&mut self, clip: &AudioTrack, offset: usize) {
        for (i, &sample) in clip.samples.iter().enumerate() {
            let Some(slot) = self.samples.get_mut(offset + i) else {
                break;
            };
            *slot = slot.saturating_add(sample);
        }
    }

    /// Time-compresses the track to exactly `target_len` samples by linear
    /// interpolation. Pitch is not preserved; duration exactness is the
    /// contract.
    pub fn compressed_to(&self, target_len: usize) -> Result<AudioTrack> {
        if target_len == 0 || self.samples.is_empty() {
            return Err(DubError::Other(
                "cannot compress to or from zero samples".to_string(),
            ));
        }

        let ratio = self.samples.len() as f64 / target_len as f64;
        let samples = (0..target_len)
            .map(|i| {
                let source_pos = i as f64 * ratio;
                let source_idx = source_pos.floor() as usize;
                let fraction = source_pos - source_idx as f64;

                if source_idx + 1 >= self.samples.len() {
                    self.samples[self.samples.len() - 1]
                } else {
                    let left = self.samples[source_idx] as f64;
                    let right = self.samples[source_idx + 1] as f64;
                    (left + (right - left) * fraction) as i16
                }
            })
            .collect();

        Ok(AudioTrack {
            samples,
            sample_rate: self.sample_rate,
        })
    }
}

/// Linear-interpolation resampler between sample rates.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                *samples.last().unwrap_or(&0)
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}
