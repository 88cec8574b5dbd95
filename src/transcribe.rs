//! Speech-to-text.
//!
//! The model is external; the adapter runs a configured command that
//! writes timestamped segments as JSON and parses the result. An empty
//! transcript is a hard error — there is nothing to dub.

use crate::config::TranscribeConfig;
use crate::error::{DubError, Result};
use crate::segment::{TimedSegment, parse_transcript};
use crate::tools::{expand_template, run_checked};
use crate::workspace::JobWorkspace;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Produces timestamped transcript segments from a vocals stem.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        vocals: &Path,
        workspace: &JobWorkspace,
    ) -> Result<Vec<TimedSegment>>;
}

/// Adapter driving a JSON-emitting transcription command.
pub struct CommandTranscriber {
    config: TranscribeConfig,
}

impl CommandTranscriber {
    pub fn new(config: TranscribeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transcriber for CommandTranscriber {
    async fn transcribe(
        &self,
        vocals: &Path,
        workspace: &JobWorkspace,
    ) -> Result<Vec<TimedSegment>> {
        let output = workspace.path("transcript.json");
        let input = vocals.display().to_string();
        let output_str = output.display().to_string();

        let args = expand_template(
            &self.config.command,
            &[("input", input.as_str()), ("output", output_str.as_str())],
        );
        let (program, rest) = args.split_first().ok_or_else(|| {
            DubError::Other("empty transcription command configured".to_string())
        })?;

        run_checked(
            program,
            rest,
            "transcription",
            Duration::from_secs(self.config.timeout_secs),
        )
        .await?;

        let json = std::fs::read_to_string(&output).map_err(|e| {
            DubError::Other(format!(
                "transcription produced no readable output: {}",
                e
            ))
        })?;

        parse_transcript(&json)
    }
}
