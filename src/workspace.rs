//! Per-job working storage.
//!
//! Every job gets its own directory under the system temp dir. All
//! intermediate artifacts (downloaded video, extracted audio, stems, TTS
//! clips, mixed track) live there, and cleanup removes the whole directory
//! unconditionally.

use crate::defaults::{JOBS_DIR_NAME, VIDEO_EXTENSIONS};
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Root directory holding all job workspaces.
pub fn jobs_root() -> PathBuf {
    std::env::temp_dir().join(JOBS_DIR_NAME)
}

/// Working directory for a single job.
#[derive(Debug, Clone)]
pub struct JobWorkspace {
    dir: PathBuf,
}

impl JobWorkspace {
    /// Creates (or reuses) the workspace directory for a job id under the
    /// default jobs root.
    pub fn create(job_id: &str) -> Result<Self> {
        Self::create_in(&jobs_root(), job_id)
    }

    /// Creates (or reuses) a workspace under an explicit root. Tests use
    /// this to keep scratch files inside a tempdir.
    pub fn create_in(root: &Path, job_id: &str) -> Result<Self> {
        let dir = root.join(job_id);
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The workspace directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a named artifact inside the workspace.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Subdirectory for per-segment TTS clips, created on first use.
    pub fn tts_dir(&self) -> Result<PathBuf> {
        let dir = self.dir.join("tts_segments");
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Finds the downloaded source video, if any strategy produced one.
    ///
    /// Acquisition strategies write `source.<ext>`; partial downloads use
    /// other suffixes and are ignored here.
    pub fn find_source_video(&self) -> Option<PathBuf> {
        let entries = fs::read_dir(&self.dir).ok()?;
        for entry in entries.flatten() {
            let path = entry.path();
            let stem_ok = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s == "source")
                .unwrap_or(false);
            let ext_ok = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| VIDEO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                .unwrap_or(false);
            if stem_ok && ext_ok {
                return Some(path);
            }
        }
        None
    }

    /// Deletes partial download artifacts (`.part`, `.ytdl`, stale
    /// `source*` files) so a failed strategy's leftovers are never mistaken
    /// for the next strategy's output.
    pub fn clear_partials(&self) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default();
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if ext == "part" || ext == "ytdl" || name.starts_with("source") {
                // Best effort; a locked file just stays behind.
                let _ = fs::remove_file(&path);
            }
        }
    }

    /// Removes the entire workspace. Errors are ignored — cleanup is
    /// unconditional and best effort.
    pub fn remove(&self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

/// Removes all working storage for a job id under the default root.
pub fn cleanup_job(job_id: &str) {
    let _ = fs::remove_dir_all(jobs_root().join(job_id));
}
