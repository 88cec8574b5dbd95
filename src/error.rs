//! Error types for polydub.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DubError {
    // Stage failures (fatal to the owning job)
    #[error("Acquisition failed: {message}")]
    Acquisition { message: String },

    #[error("Separation failed: {message}")]
    Separation { message: String },

    #[error("No speech detected in the audio")]
    NoSpeechDetected,

    #[error("Synthesis failed: {message}")]
    Synthesis { message: String },

    #[error("Mixing failed: {message}")]
    Mixing { message: String },

    // Segment-local failure (recovered by the caller, never fatal)
    #[error("Translation failed: {message}")]
    Translation { message: String },

    // Job registry errors
    #[error("Job not found: {id}")]
    JobNotFound { id: String },

    // Bounded-wait violations
    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: String, secs: u64 },

    // Input validation
    #[error("Invalid source: {message}")]
    InvalidSource { message: String },

    #[error("Required tool not found: {tool}")]
    ToolNotFound { tool: String },

    // IPC errors
    #[error("IPC socket error: {message}")]
    IpcSocket { message: String },

    #[error("IPC protocol error: {message}")]
    IpcProtocol { message: String },

    #[error("IPC connection failed: {message}")]
    IpcConnection { message: String },

    // Conversions
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DubError>;

/// Trait for reporting recoverable per-item errors inside a stage.
///
/// A single bad segment must not fail the entire dub, but the skip should
/// still be visible to operators.
pub trait ErrorReporter: Send + Sync {
    /// Reports a recoverable error from the named stage.
    fn report(&self, stage: &str, error: &DubError);
}

/// Error reporter that logs to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, stage: &str, error: &DubError) {
        eprintln!("[{}] skipped: {}", stage, error);
    }
}

/// Error reporter that drops everything (tests, quiet mode).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl ErrorReporter for NullReporter {
    fn report(&self, _stage: &str, _error: &DubError) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_acquisition_display() {
        let error = DubError::Acquisition {
            message: "all strategies exhausted".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Acquisition failed: all strategies exhausted"
        );
    }

    #[test]
    fn test_separation_display_contains_token() {
        let error = DubError::Separation {
            message: "no output directory produced".to_string(),
        };
        assert!(error.to_string().to_lowercase().contains("separation"));
    }

    #[test]
    fn test_no_speech_display() {
        assert_eq!(
            DubError::NoSpeechDetected.to_string(),
            "No speech detected in the audio"
        );
    }

    #[test]
    fn test_timeout_display() {
        let error = DubError::Timeout {
            stage: "acquisition".to_string(),
            secs: 180,
        };
        assert_eq!(error.to_string(), "acquisition timed out after 180s");
    }

    #[test]
    fn test_job_not_found_display() {
        let error = DubError::JobNotFound {
            id: "abc123".to_string(),
        };
        assert_eq!(error.to_string(), "Job not found: abc123");
    }

    #[test]
    fn test_tool_not_found_display() {
        let error = DubError::ToolNotFound {
            tool: "ffmpeg".to_string(),
        };
        assert_eq!(error.to_string(), "Required tool not found: ffmpeg");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: DubError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<DubError>();
        assert_sync::<DubError>();
    }

    #[test]
    fn test_log_reporter_does_not_panic() {
        let reporter = LogReporter;
        reporter.report("synthesize", &DubError::NoSpeechDetected);
    }
}
