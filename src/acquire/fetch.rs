//! Direct HTTP fetch strategy.
//!
//! Last resort in the download chain: when the submitted URL points
//! straight at a media file, stream it to disk without involving the
//! downloader binary at all. Watch-page URLs are skipped — there is no
//! media behind them to fetch directly.

use crate::defaults::VIDEO_EXTENSIONS;
use crate::strategy::{Strategy, StrategyOutcome};
use crate::workspace::JobWorkspace;
use async_trait::async_trait;
use futures_util::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Extension of the media file a direct URL points at, if any.
fn media_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path.rsplit('.').next()?.to_lowercase();
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

struct DirectFetch {
    url: String,
    workspace: JobWorkspace,
    timeout: Duration,
}

impl DirectFetch {
    async fn stream_to_disk(&self, ext: &str) -> Result<PathBuf, String> {
        let dest = self.workspace.path(&format!("source.{}", ext));

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {}", e))?;

        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("server returned {}", response.status()));
        }

        let mut file =
            std::fs::File::create(&dest).map_err(|e| format!("failed to create file: {}", e))?;

        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| format!("failed to read chunk: {}", e))?;
            file.write_all(&chunk)
                .map_err(|e| format!("failed to write file: {}", e))?;
            written += chunk.len() as u64;
        }

        if written == 0 {
            return Err("server sent an empty body".to_string());
        }

        Ok(dest)
    }
}

#[async_trait]
impl Strategy<PathBuf> for DirectFetch {
    fn label(&self) -> &str {
        "direct fetch"
    }

    async fn attempt(&self) -> StrategyOutcome<PathBuf> {
        let Some(ext) = media_extension(&self.url) else {
            return StrategyOutcome::Skip("not a direct media URL".to_string());
        };

        match self.stream_to_disk(&ext).await {
            Ok(path) => StrategyOutcome::Success(path),
            Err(reason) => StrategyOutcome::Failure(reason),
        }
    }
}

/// Builds the direct-fetch strategy for a URL.
pub fn direct_fetch(
    url: &str,
    workspace: &JobWorkspace,
    timeout: Duration,
) -> Box<dyn Strategy<PathBuf>> {
    Box::new(DirectFetch {
        url: url.to_string(),
        workspace: workspace.clone(),
        timeout,
    })
}
