//! Downloader-command acquisition strategies.
//!
//! Both strategies drive the configured downloader binary with a shared
//! base argument set and differ only in how they authenticate: the primary
//! one presents a cookie file, the fallback goes in as a guest with a
//! browser user agent.

use crate::config::AcquireConfig;
use crate::strategy::{Strategy, StrategyOutcome};
use crate::tools::run_checked;
use crate::workspace::JobWorkspace;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Shared downloader invocation behind both command strategies.
struct DownloadInvocation {
    label: String,
    downloader: String,
    /// Extra args prepended to the base set (auth/user-agent).
    extra_args: Vec<String>,
    /// When set, the strategy skips unless this file exists and is
    /// non-empty.
    required_cookie: Option<PathBuf>,
    url: String,
    workspace: JobWorkspace,
    timeout: Duration,
}

impl DownloadInvocation {
    fn base_args(&self) -> Vec<String> {
        vec![
            "-f".to_string(),
            "best".to_string(),
            "--no-playlist".to_string(),
            "--restrict-filenames".to_string(),
            "--no-warnings".to_string(),
            "-o".to_string(),
            self.workspace
                .path("source.%(ext)s")
                .display()
                .to_string(),
        ]
    }
}

#[async_trait]
impl Strategy<PathBuf> for DownloadInvocation {
    fn label(&self) -> &str {
        &self.label
    }

    async fn attempt(&self) -> StrategyOutcome<PathBuf> {
        if let Some(cookie) = &self.required_cookie {
            let usable = std::fs::metadata(cookie)
                .map(|m| m.is_file() && m.len() > 0)
                .unwrap_or(false);
            if !usable {
                return StrategyOutcome::Skip(format!(
                    "cookie file missing or empty: {}",
                    cookie.display()
                ));
            }
        }

        let mut args = self.extra_args.clone();
        args.extend(self.base_args());
        args.push(self.url.clone());

        if let Err(e) = run_checked(&self.downloader, &args, "download", self.timeout).await {
            return StrategyOutcome::Failure(e.to_string());
        }

        match self.workspace.find_source_video() {
            Some(video) => StrategyOutcome::Success(video),
            None => StrategyOutcome::Failure("downloaded file not found on disk".to_string()),
        }
    }
}

/// Primary strategy: authenticated download via cookie file.
pub fn cookie_download(
    config: &AcquireConfig,
    url: &str,
    workspace: &JobWorkspace,
    timeout: Duration,
) -> Box<dyn Strategy<PathBuf>> {
    let cookie = config
        .cookie_file
        .clone()
        .unwrap_or_else(|| PathBuf::from("cookies.txt"));
    Box::new(DownloadInvocation {
        label: "cookie download".to_string(),
        downloader: config.downloader.clone(),
        extra_args: vec!["--cookies".to_string(), cookie.display().to_string()],
        required_cookie: Some(cookie),
        url: url.to_string(),
        workspace: workspace.clone(),
        timeout,
    })
}

/// Fallback strategy: guest download with a browser user agent.
pub fn guest_download(
    config: &AcquireConfig,
    url: &str,
    workspace: &JobWorkspace,
    timeout: Duration,
) -> Box<dyn Strategy<PathBuf>> {
    Box::new(DownloadInvocation {
        label: "guest download".to_string(),
        downloader: config.downloader.clone(),
        extra_args: vec!["--user-agent".to_string(), config.user_agent.clone()],
        required_cookie: None,
        url: url.to_string(),
        workspace: workspace.clone(),
        timeout,
    })
}
