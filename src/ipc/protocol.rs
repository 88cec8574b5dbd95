//! JSON message protocol for IPC communication between CLI and daemon.

use crate::job::Job;
use crate::voices::LanguageInfo;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Commands sent by CLI to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Start a dubbing job for a source URL or file path
    Submit { source: String, language: String },
    /// Get a job's current record
    Status { job_id: String },
    /// Stream de-duplicated job snapshots until a terminal state
    Watch { job_id: String },
    /// Get the finished output file path
    Output { job_id: String },
    /// Remove a job's record and working storage
    Cleanup { job_id: String },
    /// Report daemon health
    Health,
    /// List supported target languages
    Languages,
    /// Shutdown the daemon
    Shutdown,
}

impl Command {
    /// Serialize command to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize command from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// One supported target language, as exposed over IPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub name: String,
    pub code: String,
    pub voice: String,
}

impl From<&LanguageInfo> for LanguageEntry {
    fn from(info: &LanguageInfo) -> Self {
        Self {
            name: info.name.to_string(),
            code: info.code.to_string(),
            voice: info.voice.to_string(),
        }
    }
}

/// Responses sent by daemon to CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Job registered; pipeline is running
    Accepted { job_id: String },
    /// A job's current record
    Status { job: Job },
    /// One watch snapshot; the stream ends after a terminal one
    Event { job: Job },
    /// Path of the finished output file
    Output { path: PathBuf },
    /// Daemon health report
    Health { ffmpeg_available: bool },
    /// Supported target languages
    Languages { languages: Vec<LanguageEntry> },
    /// Command succeeded
    Ok,
    /// Error occurred
    Error { message: String },
}

impl Response {
    /// Serialize response to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize response from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;

    fn sample_job() -> Job {
        Job {
            id: "abc123def456".to_string(),
            status: JobStatus::Processing,
            step: "separating".to_string(),
            progress: 20,
            message: "Separating vocals from background audio...".to_string(),
            error: None,
            output_file: None,
        }
    }

    #[test]
    fn test_command_submit_json_roundtrip() {
        let cmd = Command::Submit {
            source: "https://example.com/watch?v=abc".to_string(),
            language: "spanish".to_string(),
        };
        let json = cmd.to_json().expect("should serialize");
        let deserialized = Command::from_json(&json).expect("should deserialize");
        assert_eq!(cmd, deserialized);
    }

    #[test]
    fn test_command_all_variants_roundtrip() {
        let commands = vec![
            Command::Submit {
                source: "a.mp4".to_string(),
                language: "french".to_string(),
            },
            Command::Status {
                job_id: "j1".to_string(),
            },
            Command::Watch {
                job_id: "j1".to_string(),
            },
            Command::Output {
                job_id: "j1".to_string(),
            },
            Command::Cleanup {
                job_id: "j1".to_string(),
            },
            Command::Health,
            Command::Languages,
            Command::Shutdown,
        ];

        for cmd in commands {
            let json = cmd.to_json().expect("should serialize");
            let deserialized = Command::from_json(&json).expect("should deserialize");
            assert_eq!(cmd, deserialized, "roundtrip failed for {:?}", cmd);
        }
    }

    #[test]
    fn test_json_format_is_snake_case() {
        let cmd = Command::Status {
            job_id: "j1".to_string(),
        };
        let json = cmd.to_json().expect("should serialize");
        assert!(
            json.contains("\"type\":\"status\""),
            "JSON should use snake_case. Got: {}",
            json
        );
    }

    #[test]
    fn test_response_status_roundtrip() {
        let resp = Response::Status { job: sample_job() };
        let json = resp.to_json().expect("should serialize");
        let deserialized = Response::from_json(&json).expect("should deserialize");
        assert_eq!(resp, deserialized);
    }

    #[test]
    fn test_response_event_carries_job_fields() {
        let resp = Response::Event { job: sample_job() };
        let json = resp.to_json().expect("should serialize");
        assert!(json.contains("\"status\":\"processing\""));
        assert!(json.contains("\"progress\":20"));
        assert!(json.contains("\"step\":\"separating\""));
    }

    #[test]
    fn test_response_error_roundtrip() {
        let resp = Response::Error {
            message: "Job not found: j9".to_string(),
        };
        let json = resp.to_json().expect("should serialize");
        let deserialized = Response::from_json(&json).expect("should deserialize");
        assert_eq!(resp, deserialized);
    }

    #[test]
    fn test_language_entry_from_info() {
        let info = crate::voices::get_language("german").expect("german exists");
        let entry = LanguageEntry::from(info);
        assert_eq!(entry.name, "german");
        assert_eq!(entry.code, "de");
        assert_eq!(entry.voice, "de-DE-ConradNeural");
    }
}
