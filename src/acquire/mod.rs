//! Video acquisition.
//!
//! A source is either a URL or a local file. URLs go through an ordered
//! chain of download strategies (cookie-backed downloader, guest
//! downloader, direct HTTP fetch) because hosted video is the least
//! reliable part of the whole pipeline. Whatever wins, acquisition always
//! ends by extracting the source audio as mono 16kHz WAV.

pub mod command;
pub mod fetch;

use crate::config::{AcquireConfig, ToolsConfig};
use crate::defaults::VIDEO_EXTENSIONS;
use crate::error::{DubError, Result};
use crate::strategy::StrategyChain;
use crate::tools::extract_audio;
use crate::workspace::JobWorkspace;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What the caller submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceLocator {
    /// A remote page or direct media URL.
    Url(String),
    /// A local video file (upload intake).
    File(PathBuf),
}

impl SourceLocator {
    /// Classifies and validates a raw submission string.
    ///
    /// `http(s)://` strings become URLs; anything else must be an existing
    /// local file with a recognized video extension.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DubError::InvalidSource {
                message: "empty source".to_string(),
            });
        }

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Ok(SourceLocator::Url(trimmed.to_string()));
        }

        let path = PathBuf::from(trimmed);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            return Err(DubError::InvalidSource {
                message: format!(
                    "please provide a video file ({})",
                    VIDEO_EXTENSIONS.join(", ")
                ),
            });
        }
        if !path.is_file() {
            return Err(DubError::InvalidSource {
                message: format!("file not found: {}", path.display()),
            });
        }
        Ok(SourceLocator::File(path))
    }
}

/// Result of a successful acquisition.
#[derive(Debug, Clone)]
pub struct Acquired {
    /// The source video inside the job workspace.
    pub video: PathBuf,
    /// Mono 16kHz WAV extracted from the video.
    pub audio: PathBuf,
}

/// Yields a video file plus its extracted audio track, or fails with a
/// reason. The concrete mechanism behind it is deliberately opaque to the
/// pipeline.
#[async_trait]
pub trait Acquirer: Send + Sync {
    async fn acquire(&self, source: &SourceLocator, workspace: &JobWorkspace) -> Result<Acquired>;
}

/// Production acquirer: strategy-chained downloads for URLs, direct intake
/// for local files.
pub struct ChainAcquirer {
    config: AcquireConfig,
    ffmpeg: String,
    verbose: bool,
}

impl ChainAcquirer {
    pub fn new(config: AcquireConfig, tools: &ToolsConfig) -> Self {
        Self {
            config,
            ffmpeg: tools.ffmpeg.clone(),
            verbose: false,
        }
    }

    /// Enables per-strategy stderr status lines.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Copies a local file into the workspace as `source.<ext>`.
    fn intake_file(&self, path: &Path, workspace: &JobWorkspace) -> Result<PathBuf> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4")
            .to_lowercase();
        let dest = workspace.path(&format!("source.{}", ext));
        std::fs::copy(path, &dest).map_err(|e| DubError::Acquisition {
            message: format!("failed to save source file: {}", e),
        })?;
        Ok(dest)
    }

    /// Builds the ordered download chain for a URL.
    fn download_chain(&self, url: &str, workspace: &JobWorkspace) -> StrategyChain<PathBuf> {
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let mut chain = StrategyChain::new("download")
            .push(command::cookie_download(
                &self.config,
                url,
                workspace,
                timeout,
            ))
            .push(command::guest_download(
                &self.config,
                url,
                workspace,
                timeout,
            ))
            .push(fetch::direct_fetch(url, workspace, timeout));

        // A failed attempt must not leave partial files for the next one.
        let reset_ws = workspace.clone();
        chain = chain.with_reset(Box::new(move || reset_ws.clear_partials()));

        if self.verbose {
            chain = chain.with_observer(Box::new(|label| {
                eprintln!("polydub: trying {}...", label);
            }));
        }

        chain
    }
}

#[async_trait]
impl Acquirer for ChainAcquirer {
    async fn acquire(&self, source: &SourceLocator, workspace: &JobWorkspace) -> Result<Acquired> {
        let video = match source {
            SourceLocator::File(path) => self.intake_file(path, workspace)?,
            SourceLocator::Url(url) => {
                let (video, _label) = self.download_chain(url, workspace).run_or_err().await?;
                video
            }
        };

        let audio = workspace.path("source_audio.wav");
        extract_audio(
            &self.ffmpeg,
            &video,
            &audio,
            Duration::from_secs(self.config.timeout_secs),
        )
        .await
        .map_err(|e| match e {
            DubError::Timeout { .. } | DubError::ToolNotFound { .. } => e,
            other => DubError::Acquisition {
                message: format!("audio extraction failed: {}", other),
            },
        })?;

        Ok(Acquired { video, audio })
    }
}
