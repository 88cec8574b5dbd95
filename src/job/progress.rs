//! De-duplicated progress snapshots over a job's lifetime.
//!
//! Consumers subscribe to a job's progress by polling the store on a fixed
//! cadence and only surfacing snapshots when something they care about
//! actually changed. The watcher ends after the first terminal snapshot,
//! so a subscription never outlives its job's run.

use crate::defaults::PROGRESS_POLL_MS;
use crate::job::{Job, JobStatus, JobStore};
use std::time::Duration;

/// Comparison key for change detection: exactly the fields the progress
/// surface exposes.
type SnapshotKey = (JobStatus, u8, String, String);

fn key_of(job: &Job) -> SnapshotKey {
    (
        job.status,
        job.progress,
        job.step.clone(),
        job.message.clone(),
    )
}

/// Incremental, de-duplicated view of one job's record.
pub struct ProgressWatcher {
    store: JobStore,
    job_id: String,
    poll_interval: Duration,
    last: Option<SnapshotKey>,
    finished: bool,
}

impl ProgressWatcher {
    /// Creates a watcher with the default 1s poll cadence.
    pub fn new(store: JobStore, job_id: impl Into<String>) -> Self {
        Self {
            store,
            job_id: job_id.into(),
            poll_interval: Duration::from_millis(PROGRESS_POLL_MS),
            last: None,
            finished: false,
        }
    }

    /// Overrides the poll cadence (tests use a short one).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Waits for the next observable change and returns its snapshot.
    ///
    /// Returns `None` once the job record disappears or after a terminal
    /// snapshot has been delivered. Suspends between polls, so a slow
    /// stage never blocks the caller's task.
    pub async fn next(&mut self) -> Option<Job> {
        if self.finished {
            return None;
        }

        loop {
            let Some(job) = self.store.get(&self.job_id) else {
                self.finished = true;
                return None;
            };

            let key = key_of(&job);
            if self.last.as_ref() != Some(&key) {
                self.last = Some(key);
                if job.status.is_terminal() {
                    self.finished = true;
                }
                return Some(job);
            }

            if job.status.is_terminal() {
                // Terminal and already delivered.
                self.finished = true;
                return None;
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Drains the watcher into a vector of snapshots (testing aid).
    pub async fn collect(mut self) -> Vec<Job> {
        let mut snapshots = Vec::new();
        while let Some(job) = self.next().await {
            snapshots.push(job);
        }
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobUpdate;

    fn fast_watcher(store: &JobStore, id: &str) -> ProgressWatcher {
        ProgressWatcher::new(store.clone(), id).with_poll_interval(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_unknown_job_yields_nothing() {
        let store = JobStore::new();
        let mut watcher = fast_watcher(&store, "ghost");
        assert!(watcher.next().await.is_none());
    }

    #[tokio::test]
    async fn test_first_snapshot_is_current_state() {
        let store = JobStore::new();
        store.create("j1");

        let mut watcher = fast_watcher(&store, "j1");
        let snap = watcher.next().await.expect("initial snapshot");
        assert_eq!(snap.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn test_deduplicates_unchanged_state() {
        let store = JobStore::new();
        store.create("j1");

        let mut watcher = fast_watcher(&store, "j1");
        let _first = watcher.next().await.expect("initial snapshot");

        // No change: watcher must keep sleeping, not emit a duplicate.
        let raced = tokio::time::timeout(Duration::from_millis(40), watcher.next()).await;
        assert!(raced.is_err(), "no duplicate snapshot for unchanged job");
    }

    #[tokio::test]
    async fn test_emits_one_snapshot_per_change_until_terminal() {
        let store = JobStore::new();
        store.create("j1");

        let writer = store.clone();
        let producer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.update(
                "j1",
                JobUpdate::new()
                    .status(JobStatus::Processing)
                    .progress(5)
                    .step("downloading")
                    .message("Downloading video"),
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.update("j1", JobUpdate::new().progress(35).step("separating"));
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.update(
                "j1",
                JobUpdate::new()
                    .status(JobStatus::Completed)
                    .progress(100)
                    .message("done"),
            );
        });

        let snapshots = fast_watcher(&store, "j1").collect().await;
        producer.await.expect("producer");

        assert!(snapshots.len() >= 2, "at least initial + terminal");
        assert_eq!(
            snapshots.last().expect("terminal").status,
            JobStatus::Completed
        );

        // Progress is non-decreasing across the observed sequence.
        let mut prev = 0;
        for snap in &snapshots {
            assert!(snap.progress >= prev, "progress must never decrease");
            prev = snap.progress;
        }
    }

    #[tokio::test]
    async fn test_stops_after_terminal_snapshot() {
        let store = JobStore::new();
        store.create("j1");
        store.update(
            "j1",
            JobUpdate::new().status(JobStatus::Failed).error("boom"),
        );

        let mut watcher = fast_watcher(&store, "j1");
        let snap = watcher.next().await.expect("terminal snapshot");
        assert_eq!(snap.status, JobStatus::Failed);
        assert!(watcher.next().await.is_none());
        assert!(watcher.next().await.is_none());
    }
}
