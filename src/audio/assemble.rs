//! Timeline reconstruction from synthesized clips.
//!
//! Synthesized speech rarely matches the original utterance's duration, so
//! the dubbed track cannot simply concatenate clips. Each clip is anchored
//! at its segment's original start timestamp on a silent timeline; clips
//! that overrun their slot beyond a threshold are time-compressed back to
//! the slot length so speech never drifts arbitrarily far past its cue.

use crate::audio::track::AudioTrack;
use crate::defaults::{COMPRESS_THRESHOLD, SAMPLE_RATE, TAIL_PAD_SECS};
use crate::error::{DubError, ErrorReporter, Result};
use std::path::PathBuf;

/// A synthesized clip with its segment's original window.
#[derive(Debug, Clone)]
pub struct PlacedClip {
    /// Normalized WAV file holding the synthesized speech.
    pub source: PathBuf,
    /// Original segment start, seconds.
    pub start: f64,
    /// Original segment end, seconds.
    pub end: f64,
}

/// Places one clip onto the timeline at its original start offset.
///
/// `slot = end - start`; when the clip runs longer than
/// [`COMPRESS_THRESHOLD`] times the slot it is compressed to exactly the
/// slot length first. Shorter overruns are placed as-is and bleed into the
/// following slot. Overlay is additive, so placement order is irrelevant
/// and overlapping windows simply sum (accepted as-is, no collision
/// resolution).
pub fn place_clip(timeline: &mut AudioTrack, clip: AudioTrack, start: f64, end: f64) -> Result<()> {
    let slot_duration = end - start;
    if slot_duration <= 0.0 || !slot_duration.is_finite() || !start.is_finite() {
        return Err(DubError::Other(format!(
            "degenerate segment window: start={}, end={}",
            start, end
        )));
    }

    let rate = timeline.sample_rate();
    let slot_samples = (slot_duration * rate as f64).round() as usize;

    let clip = if clip.duration_secs() > COMPRESS_THRESHOLD * slot_duration {
        clip.compressed_to(slot_samples)?
    } else {
        clip
    };

    let offset = (start * rate as f64).round() as usize;
    timeline.overlay_at(&clip, offset);
    Ok(())
}

/// Builds the full-length speech track from per-segment clips.
///
/// The timeline spans `max(end) + 5s` of silence; every clip is loaded,
/// possibly compressed, and overlaid at `round(start * sample_rate)`. A
/// clip that cannot be loaded or placed is reported and skipped — one bad
/// segment must not fail the whole dub.
///
/// # Errors
/// `NoSpeechDetected` when `clips` is empty; there is no such thing as an
/// empty dub.
pub fn assemble_speech_track(
    clips: &[PlacedClip],
    reporter: &dyn ErrorReporter,
) -> Result<AudioTrack> {
    if clips.is_empty() {
        return Err(DubError::NoSpeechDetected);
    }

    let max_end = clips.iter().map(|c| c.end).fold(f64::MIN, f64::max);
    let mut timeline = AudioTrack::silent(max_end + TAIL_PAD_SECS, SAMPLE_RATE);

    for placed in clips {
        let loaded = match AudioTrack::from_wav(&placed.source) {
            Ok(track) => track,
            Err(e) => {
                reporter.report("assemble", &e);
                continue;
            }
        };

        if let Err(e) = place_clip(&mut timeline, loaded, placed.start, placed.end) {
            reporter.report("assemble", &e);
        }
    }

    Ok(timeline)
}
