//! Job records and the process-wide job registry.
//!
//! One `Job` is one end-to-end dubbing request's mutable progress/result
//! record. The `JobStore` is the single source of truth: the orchestrator
//! is its sole writer, everything else (IPC handlers, watchers) only
//! reads. The store is a cloneable handle around a mutex-guarded map, so
//! it is injected explicitly rather than living in a global.

pub mod progress;

use crate::defaults::JOB_ID_LEN;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Lifecycle state of a job. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// True for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One dubbing request's record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Free-text label of the current stage.
    pub step: String,
    /// 0–100, non-decreasing while processing.
    pub progress: u8,
    /// Human-readable current action.
    pub message: String,
    /// Set exactly when `status == Failed`.
    pub error: Option<String>,
    /// Set exactly when `status == Completed`.
    pub output_file: Option<PathBuf>,
}

impl Job {
    fn queued(id: &str) -> Self {
        Self {
            id: id.to_string(),
            status: JobStatus::Queued,
            step: "queued".to_string(),
            progress: 0,
            message: "Job queued".to_string(),
            error: None,
            output_file: None,
        }
    }
}

/// Fixed-shape partial update, merged atomically into a job record.
///
/// One optional slot per mutable field; there are no free-form keys, so an
/// update can only touch fields the record actually has. Unset slots leave
/// the existing value unchanged.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    status: Option<JobStatus>,
    step: Option<String>,
    progress: Option<u8>,
    message: Option<String>,
    error: Option<String>,
    output_file: Option<PathBuf>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress.min(100));
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    fn apply(self, job: &mut Job) {
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(step) = self.step {
            job.step = step;
        }
        if let Some(progress) = self.progress {
            job.progress = progress;
        }
        if let Some(message) = self.message {
            job.message = message;
        }
        if let Some(error) = self.error {
            job.error = Some(error);
        }
        if let Some(output_file) = self.output_file {
            job.output_file = Some(output_file);
        }
    }
}

/// Generates a fresh opaque job id.
pub fn new_job_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    hex[..JOB_ID_LEN].to_string()
}

/// Cloneable handle to the process-wide job registry.
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    inner: Arc<Mutex<HashMap<String, Job>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh `queued` record for the id, replacing any
    /// existing record wholesale.
    pub fn create(&self, id: &str) {
        let mut jobs = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        jobs.insert(id.to_string(), Job::queued(id));
    }

    /// Atomically merges the update's set fields into the record. A record
    /// is created on the fly for unknown ids, matching the original
    /// service's behavior; readers never observe a partially-applied
    /// update.
    pub fn update(&self, id: &str, update: JobUpdate) {
        let mut jobs = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let job = jobs.entry(id.to_string()).or_insert_with(|| Job::queued(id));
        update.apply(job);
    }

    /// Snapshot of a job record.
    pub fn get(&self, id: &str) -> Option<Job> {
        let jobs = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        jobs.get(id).cloned()
    }

    /// Removes a record, reporting whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        let mut jobs = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        jobs.remove(id).is_some()
    }

    /// Number of known jobs.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True when no jobs are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
