//! Final video muxing.
//!
//! Attaches the mixed audio track to the original video: the picture
//! stream is copied untouched, the audio re-encoded at a fixed codec and
//! bitrate. Muxing failure is fatal to the job — there is no fallback for
//! a broken render.

use crate::config::ToolsConfig;
use crate::defaults::{MUX_AUDIO_BITRATE, MUX_AUDIO_CODEC, MUX_TIMEOUT_SECS};
use crate::error::{DubError, Result};
use crate::tools::run_checked;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Produces the final video from the original picture stream and the
/// mixed audio track.
#[async_trait]
pub trait Muxer: Send + Sync {
    async fn mux(&self, video: &Path, mixed_audio: &Path, output: &Path) -> Result<PathBuf>;
}

/// ffmpeg-backed muxer.
pub struct FfmpegMuxer {
    ffmpeg: String,
}

impl FfmpegMuxer {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
        }
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    async fn mux(&self, video: &Path, mixed_audio: &Path, output: &Path) -> Result<PathBuf> {
        let args = vec![
            "-y".to_string(),
            "-i".to_string(),
            video.display().to_string(),
            "-i".to_string(),
            mixed_audio.display().to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            MUX_AUDIO_CODEC.to_string(),
            "-b:a".to_string(),
            MUX_AUDIO_BITRATE.to_string(),
            output.display().to_string(),
        ];

        run_checked(
            &self.ffmpeg,
            &args,
            "muxing",
            Duration::from_secs(MUX_TIMEOUT_SECS),
        )
        .await
        .map_err(|e| match e {
            DubError::Timeout { .. } => e,
            other => DubError::Mixing {
                message: other.to_string(),
            },
        })?;

        Ok(output.to_path_buf())
    }
}
