//! Weighted overlay mix of speech and background.

use crate::audio::track::AudioTrack;
use crate::error::{DubError, Result};

/// Blends the background stem under the assembled speech track.
///
/// "Longest" duration policy: the output is as long as the longer input,
/// with the shorter one implicitly zero-padded. Each output sample is
/// `bg * w_bg + speech * w_speech`, clamped to the i16 range.
///
/// # Errors
/// Fails when the tracks' sample rates differ — both inputs are supposed
/// to be normalized before mixing.
pub fn mix_tracks(
    background: &AudioTrack,
    speech: &AudioTrack,
    background_weight: f32,
    speech_weight: f32,
) -> Result<AudioTrack> {
    if background.sample_rate() != speech.sample_rate() {
        return Err(DubError::Mixing {
            message: format!(
                "sample rate mismatch: background {} Hz vs speech {} Hz",
                background.sample_rate(),
                speech.sample_rate()
            ),
        });
    }

    let len = background.len().max(speech.len());
    let bg = background.samples();
    let sp = speech.samples();

    let samples = (0..len)
        .map(|i| {
            let b = bg.get(i).copied().unwrap_or(0) as f32;
            let s = sp.get(i).copied().unwrap_or(0) as f32;
            (b * background_weight + s * speech_weight)
                .round()
                .clamp(i16::MIN as f32, i16::MAX as f32) as i16
        })
        .collect();

    Ok(AudioTrack::from_samples(samples, background.sample_rate()))
}
