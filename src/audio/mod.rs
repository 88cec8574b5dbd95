//! Timestamp-aligned audio assembly.
//!
//! Everything here operates on mono 16kHz i16 sample buffers. The
//! collaborator adapters normalize their output to that format before any
//! of this code runs.

pub mod assemble;
pub mod mix;
pub mod track;

pub use assemble::{PlacedClip, assemble_speech_track, place_clip};
pub use mix::mix_tracks;
pub use track::AudioTrack;
