//! Speech/background source separation.
//!
//! The separation model itself is an external collaborator: a command that
//! takes the source audio and leaves a vocals stem and a background stem
//! somewhere under its output directory. The adapter's job is running it
//! within a bound, finding both stems, and normalizing them to the
//! engine's internal WAV format.

use crate::config::{SeparateConfig, ToolsConfig};
use crate::error::{DubError, Result};
use crate::tools::{expand_template, normalize_wav, run_checked};
use crate::workspace::JobWorkspace;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Separated stems, both mono 16kHz WAV.
#[derive(Debug, Clone)]
pub struct Stems {
    pub vocals: PathBuf,
    pub background: PathBuf,
}

/// Splits an audio file into a vocals stem and a background stem.
#[async_trait]
pub trait Separator: Send + Sync {
    async fn separate(&self, audio: &Path, workspace: &JobWorkspace) -> Result<Stems>;
}

/// Adapter driving a two-stem separation command (demucs-style).
pub struct CommandSeparator {
    config: SeparateConfig,
    ffmpeg: String,
}

impl CommandSeparator {
    pub fn new(config: SeparateConfig, tools: &ToolsConfig) -> Self {
        Self {
            config,
            ffmpeg: tools.ffmpeg.clone(),
        }
    }
}

/// Recursively collects files under a directory.
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out);
        } else {
            out.push(path);
        }
    }
}

/// Locates the vocals and background stems in the separation output.
///
/// Separation tools name stems after the source ("vocals", "no_vocals")
/// and nest them under a model-named directory, so this scans recursively.
/// "no_vocals" is checked first — its name contains "vocals" too.
fn find_stems(outdir: &Path) -> Option<(PathBuf, PathBuf)> {
    let mut files = Vec::new();
    collect_files(outdir, &mut files);

    let mut vocals = None;
    let mut background = None;
    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if name.contains("no_vocals") {
            background = Some(path);
        } else if name.contains("vocals") {
            vocals = Some(path);
        }
    }
    Some((vocals?, background?))
}

#[async_trait]
impl Separator for CommandSeparator {
    async fn separate(&self, audio: &Path, workspace: &JobWorkspace) -> Result<Stems> {
        let outdir = workspace.path("separated");
        let input = audio.display().to_string();
        let outdir_str = outdir.display().to_string();

        let args = expand_template(
            &self.config.command,
            &[("input", input.as_str()), ("outdir", outdir_str.as_str())],
        );
        let (program, rest) = args.split_first().ok_or_else(|| DubError::Separation {
            message: "empty separation command configured".to_string(),
        })?;

        run_checked(
            program,
            rest,
            "separation",
            Duration::from_secs(self.config.timeout_secs),
        )
        .await
        .map_err(|e| match e {
            DubError::Timeout { .. } | DubError::ToolNotFound { .. } => e,
            other => DubError::Separation {
                message: other.to_string(),
            },
        })?;

        let (raw_vocals, raw_background) =
            find_stems(&outdir).ok_or_else(|| DubError::Separation {
                message: "separation output not found".to_string(),
            })?;

        // Stems may come back as mp3; sample math needs mono 16kHz WAV.
        let vocals = workspace.path("vocals.wav");
        let background = workspace.path("background.wav");
        let normalize_timeout = Duration::from_secs(self.config.timeout_secs);
        for (raw, out) in [(&raw_vocals, &vocals), (&raw_background, &background)] {
            normalize_wav(&self.ffmpeg, raw, out, normalize_timeout)
                .await
                .map_err(|e| match e {
                    DubError::Timeout { .. } | DubError::ToolNotFound { .. } => e,
                    other => DubError::Separation {
                        message: format!("stem conversion failed: {}", other),
                    },
                })?;
        }

        Ok(Stems { vocals, background })
    }
}
