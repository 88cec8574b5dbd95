//! External tool plumbing.
//!
//! The heavy lifting (downloading, separation, transcription, TTS, muxing)
//! is done by external command-line tools. This module holds the shared
//! glue: presence probes, bounded execution, placeholder expansion for
//! configured command templates, and the ffmpeg invocations used to pull
//! audio out of video and normalize clips to the engine's internal format.

use crate::defaults::SAMPLE_RATE;
use crate::error::{DubError, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Maximum stderr length carried into error messages.
const STDERR_LIMIT: usize = 500;

/// Checks whether ffmpeg is runnable.
pub fn check_ffmpeg(ffmpeg: &str) -> bool {
    std::process::Command::new(ffmpeg)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Truncates tool stderr for error messages.
pub fn truncate_stderr(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.len() <= STDERR_LIMIT {
        trimmed.to_string()
    } else {
        let mut end = STDERR_LIMIT;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        trimmed[..end].to_string()
    }
}

/// Expands `{name}` placeholders in a command template.
///
/// Each element of the template is scanned for every `(name, value)` pair;
/// unknown placeholders are left untouched so misconfigurations surface in
/// the tool's own error output rather than silently vanishing.
pub fn expand_template(template: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            let mut expanded = arg.clone();
            for (name, value) in vars {
                expanded = expanded.replace(&format!("{{{}}}", name), value);
            }
            expanded
        })
        .collect()
}

/// Runs a command to completion within a bound, failing on non-zero exit.
///
/// The command's stdout/stderr are captured; on failure the truncated
/// stderr becomes the error message. A timeout surfaces as
/// `DubError::Timeout` for the given stage name.
pub async fn run_checked(
    program: &str,
    args: &[String],
    stage: &str,
    timeout: Duration,
) -> Result<std::process::Output> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command.output();

    let output = tokio::time::timeout(timeout, child)
        .await
        .map_err(|_| DubError::Timeout {
            stage: stage.to_string(),
            secs: timeout.as_secs(),
        })?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DubError::ToolNotFound {
                    tool: program.to_string(),
                }
            } else {
                DubError::Io(e)
            }
        })?;

    if !output.status.success() {
        return Err(DubError::Other(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            truncate_stderr(&output.stderr)
        )));
    }

    Ok(output)
}

/// Extracts the audio track of a video as mono 16kHz WAV.
pub async fn extract_audio(
    ffmpeg: &str,
    video: &Path,
    out_wav: &Path,
    timeout: Duration,
) -> Result<()> {
    let args = vec![
        "-y".to_string(),
        "-i".to_string(),
        video.display().to_string(),
        "-vn".to_string(),
        "-ac".to_string(),
        "1".to_string(),
        "-ar".to_string(),
        SAMPLE_RATE.to_string(),
        "-f".to_string(),
        "wav".to_string(),
        out_wav.display().to_string(),
    ];
    run_checked(ffmpeg, &args, "audio extraction", timeout).await?;
    Ok(())
}

/// Re-encodes any audio file into the engine's internal mono 16kHz WAV.
///
/// Used on separation stems (often mp3) and TTS clips before sample math.
pub async fn normalize_wav(
    ffmpeg: &str,
    input: &Path,
    out_wav: &Path,
    timeout: Duration,
) -> Result<()> {
    let args = vec![
        "-y".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-ac".to_string(),
        "1".to_string(),
        "-ar".to_string(),
        SAMPLE_RATE.to_string(),
        "-f".to_string(),
        "wav".to_string(),
        out_wav.display().to_string(),
    ];
    run_checked(ffmpeg, &args, "audio normalization", timeout).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_template_basic() {
        let template = vec![
            "demucs".to_string(),
            "-o".to_string(),
            "{outdir}".to_string(),
            "{input}".to_string(),
        ];
        let expanded = expand_template(&template, &[("outdir", "/tmp/sep"), ("input", "a.wav")]);
        assert_eq!(expanded, vec!["demucs", "-o", "/tmp/sep", "a.wav"]);
    }

    #[test]
    fn test_expand_template_multiple_in_one_arg() {
        let template = vec!["{a}-{b}".to_string()];
        let expanded = expand_template(&template, &[("a", "x"), ("b", "y")]);
        assert_eq!(expanded, vec!["x-y"]);
    }

    #[test]
    fn test_expand_template_leaves_unknown_placeholders() {
        let template = vec!["{unknown}".to_string()];
        let expanded = expand_template(&template, &[("known", "v")]);
        assert_eq!(expanded, vec!["{unknown}"]);
    }

    #[test]
    fn test_truncate_stderr_short() {
        assert_eq!(truncate_stderr(b"  oops \n"), "oops");
    }

    #[test]
    fn test_truncate_stderr_long() {
        let long = "x".repeat(2000);
        let truncated = truncate_stderr(long.as_bytes());
        assert_eq!(truncated.len(), 500);
    }

    #[tokio::test]
    async fn test_run_checked_missing_tool() {
        let err = run_checked(
            "definitely-not-a-real-tool-xyz",
            &[],
            "test",
            Duration::from_secs(5),
        )
        .await
        .expect_err("missing tool should fail");
        assert!(matches!(err, DubError::ToolNotFound { .. }));
    }

    #[tokio::test]
    async fn test_run_checked_nonzero_exit() {
        // `false` exists on any POSIX host and always exits 1.
        let err = run_checked("false", &[], "test", Duration::from_secs(5))
            .await
            .expect_err("non-zero exit should fail");
        assert!(matches!(err, DubError::Other(_)));
    }

    #[tokio::test]
    async fn test_run_checked_timeout() {
        let err = run_checked(
            "sleep",
            &["5".to_string()],
            "nap",
            Duration::from_millis(50),
        )
        .await
        .expect_err("should time out");
        match err {
            DubError::Timeout { stage, .. } => assert_eq!(stage, "nap"),
            other => panic!("expected Timeout, got {:?}", other),
        }
    }
}
