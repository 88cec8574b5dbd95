//! Speech synthesis.
//!
//! One TTS command invocation per segment. The voice engine writes
//! whatever container it likes (edge-tts emits mp3); the adapter then
//! normalizes the clip to mono 16kHz WAV for the assembler. A failed
//! segment is the caller's problem to skip — synthesis errors are never
//! fatal per se.

use crate::config::{ToolsConfig, TtsConfig};
use crate::error::{DubError, Result};
use crate::tools::{expand_template, normalize_wav, run_checked};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Renders text as speech audio in the given voice, writing a normalized
/// WAV clip to `out_wav`.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str, out_wav: &Path) -> Result<()>;
}

/// Adapter driving an edge-tts-style synthesis command.
pub struct CommandSynthesizer {
    config: TtsConfig,
    ffmpeg: String,
}

impl CommandSynthesizer {
    pub fn new(config: TtsConfig, tools: &ToolsConfig) -> Self {
        Self {
            config,
            ffmpeg: tools.ffmpeg.clone(),
        }
    }
}

#[async_trait]
impl Synthesizer for CommandSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str, out_wav: &Path) -> Result<()> {
        let raw = out_wav.with_extension("mp3");
        let raw_str = raw.display().to_string();

        let args = expand_template(
            &self.config.command,
            &[
                ("text", text),
                ("voice", voice),
                ("output", raw_str.as_str()),
            ],
        );
        let (program, rest) = args.split_first().ok_or_else(|| DubError::Synthesis {
            message: "empty TTS command configured".to_string(),
        })?;

        let timeout = Duration::from_secs(self.config.timeout_secs);
        run_checked(program, rest, "synthesis", timeout)
            .await
            .map_err(|e| DubError::Synthesis {
                message: e.to_string(),
            })?;

        let produced = std::fs::metadata(&raw)
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !produced {
            return Err(DubError::Synthesis {
                message: "voice engine produced no audio".to_string(),
            });
        }

        normalize_wav(&self.ffmpeg, &raw, out_wav, timeout)
            .await
            .map_err(|e| DubError::Synthesis {
                message: format!("clip conversion failed: {}", e),
            })?;

        // The raw clip is scratch; the workspace cleanup would catch it
        // anyway.
        let _ = std::fs::remove_file(&raw);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_engine_is_synthesis_error() {
        let dir = TempDir::new().expect("tempdir");
        let synthesizer = CommandSynthesizer::new(
            TtsConfig {
                command: vec![
                    "definitely-not-a-tts-engine-xyz".to_string(),
                    "{text}".to_string(),
                ],
                timeout_secs: 5,
            },
            &ToolsConfig::default(),
        );

        let err = synthesizer
            .synthesize("hola", "es-ES-AlvaroNeural", &dir.path().join("seg.wav"))
            .await
            .expect_err("missing engine");
        assert!(matches!(err, DubError::Synthesis { .. }));
    }

    #[tokio::test]
    async fn test_engine_writing_nothing_is_synthesis_error() {
        let dir = TempDir::new().expect("tempdir");
        let synthesizer = CommandSynthesizer::new(
            TtsConfig {
                command: vec!["true".to_string(), "{output}".to_string()],
                timeout_secs: 5,
            },
            &ToolsConfig::default(),
        );

        let err = synthesizer
            .synthesize("hola", "es-ES-AlvaroNeural", &dir.path().join("seg.wav"))
            .await
            .expect_err("no audio produced");
        match err {
            DubError::Synthesis { message } => {
                assert!(message.contains("no audio"));
            }
            other => panic!("expected Synthesis, got {:?}", other),
        }
    }
}
