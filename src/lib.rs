//! polydub - Multi-language video dubbing pipeline
//!
//! Turns a source video into a version dubbed into a target language:
//! acquire → separate → transcribe → translate → synthesize → mix.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod acquire;
pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod daemon;
pub mod defaults;
pub mod error;
pub mod ipc;
pub mod job;
pub mod mux;
pub mod pipeline;
pub mod segment;
pub mod separate;
pub mod strategy;
pub mod synth;
pub mod tools;
pub mod transcribe;
pub mod translate;
pub mod voices;
pub mod workspace;

// L4 composition root - needs everything
#[cfg(feature = "cli")]
pub mod app;

// Collaborator seams (acquire → separate → transcribe → translate →
// synthesize → mix)
pub use acquire::{Acquired, Acquirer, SourceLocator};
pub use mux::Muxer;
pub use separate::{Separator, Stems};
pub use synth::Synthesizer;
pub use transcribe::Transcriber;
pub use translate::Translator;

// Core engine
pub use audio::{AudioTrack, PlacedClip, assemble_speech_track, mix_tracks};
pub use job::progress::ProgressWatcher;
pub use job::{Job, JobStatus, JobStore, JobUpdate};
pub use pipeline::{Collaborators, Orchestrator};
pub use segment::TimedSegment;
pub use strategy::{ChainExhausted, Strategy, StrategyChain, StrategyOutcome};

// Error handling
pub use error::{DubError, ErrorReporter, LogReporter, NullReporter, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
