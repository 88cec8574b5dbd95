//! Default constants for polydub.
//!
//! Shared fixed values used across configuration, the audio engine and the
//! pipeline, collected here so the numbers exist in exactly one place.

/// Internal audio sample rate in Hz.
///
/// Every track the engine touches (extracted source audio, separated stems,
/// synthesized clips) is normalized to 16kHz mono WAV before sample math.
pub const SAMPLE_RATE: u32 = 16000;

/// Trailing silence appended to the assembled speech track, in seconds.
///
/// Guarantees the timeline extends past the last segment's end so trailing
/// speech is never truncated by the mix.
pub const TAIL_PAD_SECS: f64 = 5.0;

/// Clip-to-slot duration ratio above which a synthesized clip is
/// time-compressed back to its slot length.
///
/// Clips up to 1.5x their slot are placed as-is and allowed to overrun into
/// the following slot; anything longer would drift arbitrarily far past its
/// original cue.
pub const COMPRESS_THRESHOLD: f64 = 1.5;

/// Mix weight applied to the background stem.
pub const BACKGROUND_WEIGHT: f32 = 0.3;

/// Mix weight applied to the assembled speech track.
pub const SPEECH_WEIGHT: f32 = 1.0;

/// Audio codec used when muxing the final video.
pub const MUX_AUDIO_CODEC: &str = "aac";

/// Audio bitrate used when muxing the final video.
pub const MUX_AUDIO_BITRATE: &str = "192k";

/// Default bound on a single acquisition attempt, in seconds.
pub const ACQUIRE_TIMEOUT_SECS: u64 = 180;

/// Default bound on the separation command, in seconds.
///
/// Source separation is by far the slowest stage; ten minutes covers long
/// videos on CPU-only hosts.
pub const SEPARATE_TIMEOUT_SECS: u64 = 600;

/// Default bound on the transcription command, in seconds.
pub const TRANSCRIBE_TIMEOUT_SECS: u64 = 600;

/// Default bound on a single translation or TTS network call, in seconds.
pub const NETWORK_TIMEOUT_SECS: u64 = 30;

/// Default bound on a single TTS synthesis command, in seconds.
pub const SYNTH_TIMEOUT_SECS: u64 = 60;

/// Default bound on the final mux, in seconds.
pub const MUX_TIMEOUT_SECS: u64 = 300;

/// Poll interval for progress watchers, in milliseconds.
pub const PROGRESS_POLL_MS: u64 = 1000;

/// Length of generated job identifiers (hex characters).
pub const JOB_ID_LEN: usize = 12;

/// File extensions accepted as video sources.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "avi", "mov"];

/// Name of the per-job working directory under the system temp dir.
pub const JOBS_DIR_NAME: &str = "polydub-jobs";

// Progress checkpoints per stage. Entry value is written when the stage
// starts, done value when it finishes. Translation advances proportionally
// between its entry and done values.
pub const PROGRESS_ACQUIRE: u8 = 5;
pub const PROGRESS_ACQUIRE_DONE: u8 = 15;
pub const PROGRESS_SEPARATE: u8 = 20;
pub const PROGRESS_SEPARATE_DONE: u8 = 35;
pub const PROGRESS_TRANSCRIBE: u8 = 40;
pub const PROGRESS_TRANSCRIBE_DONE: u8 = 55;
pub const PROGRESS_TRANSLATE: u8 = 60;
pub const PROGRESS_TRANSLATE_SPAN: u8 = 15;
pub const PROGRESS_SYNTHESIZE: u8 = 75;
pub const PROGRESS_SYNTHESIZE_DONE: u8 = 85;
pub const PROGRESS_MIX: u8 = 88;
pub const PROGRESS_MIX_DONE: u8 = 95;
pub const PROGRESS_COMPLETE: u8 = 100;
