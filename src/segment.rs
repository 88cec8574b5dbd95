//! Timed transcript segments.
//!
//! A segment is one time-bounded utterance: original timestamps from the
//! transcriber plus the source text and (once translation has run) the
//! target-language text. Segments map 1:1 to synthesized clips downstream;
//! a segment with empty text produces no clip.

use crate::error::{DubError, Result};
use serde::{Deserialize, Serialize};

/// One transcribed utterance with original timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedSegment {
    /// Start offset in the source audio, seconds.
    pub start: f64,
    /// End offset in the source audio, seconds. Always greater than `start`.
    pub end: f64,
    /// Source-language transcript.
    pub text: String,
    /// Target-language text. Empty until translation runs, and left empty
    /// when translation was skipped for this segment.
    #[serde(default)]
    pub translated: String,
}

impl TimedSegment {
    /// Creates a segment with no translation yet.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            translated: String::new(),
        }
    }

    /// Duration of the original slot, seconds.
    pub fn slot_duration(&self) -> f64 {
        self.end - self.start
    }

    /// The text to synthesize: the translation, falling back to the
    /// original transcript when translation was skipped or failed.
    pub fn spoken_text(&self) -> &str {
        if self.translated.is_empty() {
            &self.text
        } else {
            &self.translated
        }
    }

    /// True when there is nothing to speak for this segment.
    pub fn is_silent(&self) -> bool {
        self.text.is_empty() && self.translated.is_empty()
    }
}

/// Parses a transcriber's JSON output into segments.
///
/// Expects an array of `{"start": f64, "end": f64, "text": "..."}` objects.
/// Text is trimmed; segments with invalid timing (`end <= start`) are
/// rejected. The result is sorted by start so the non-decreasing-order
/// contract holds even for tools that emit segments out of order.
///
/// # Errors
/// Returns `NoSpeechDetected` for an empty array; malformed JSON and
/// invalid timing surface as `Other` with context.
pub fn parse_transcript(json: &str) -> Result<Vec<TimedSegment>> {
    #[derive(Deserialize)]
    struct RawSegment {
        start: f64,
        end: f64,
        text: String,
    }

    let raw: Vec<RawSegment> = serde_json::from_str(json)
        .map_err(|e| DubError::Other(format!("Invalid transcript JSON: {}", e)))?;

    let mut segments = Vec::with_capacity(raw.len());
    for seg in raw {
        if !seg.start.is_finite() || !seg.end.is_finite() || seg.end <= seg.start {
            return Err(DubError::Other(format!(
                "Invalid segment timing: start={}, end={}",
                seg.start, seg.end
            )));
        }
        segments.push(TimedSegment::new(seg.start, seg.end, seg.text.trim()));
    }

    if segments.is_empty() {
        return Err(DubError::NoSpeechDetected);
    }

    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(segments)
}
