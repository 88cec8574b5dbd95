//! Command handler implementation for the daemon.

use crate::acquire::SourceLocator;
use crate::daemon::DaemonState;
use crate::ipc::protocol::{Command, LanguageEntry, Response};
use crate::ipc::server::{CommandHandler, Reply};
use crate::job::JobStatus;
use crate::job::progress::ProgressWatcher;
use crate::tools::check_ffmpeg;
use crate::voices::list_languages;
use crate::workspace::cleanup_job;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Command handler for daemon IPC commands.
pub struct DaemonCommandHandler {
    state: Arc<DaemonState>,
}

impl DaemonCommandHandler {
    /// Creates a new command handler.
    pub fn new(state: Arc<DaemonState>) -> Self {
        Self { state }
    }

    /// Register a job and spawn its pipeline run.
    fn submit(&self, source: &str, language: &str) -> Response {
        let source = match SourceLocator::parse(source) {
            Ok(source) => source,
            Err(e) => {
                return Response::Error {
                    message: e.to_string(),
                };
            }
        };

        let job_id = self.state.orchestrator.submit(source, language);
        Response::Accepted { job_id }
    }

    /// Current record for a job.
    fn status(&self, job_id: &str) -> Response {
        match self.state.store.get(job_id) {
            Some(job) => Response::Status { job },
            None => Response::Error {
                message: format!("Job not found: {}", job_id),
            },
        }
    }

    /// Stream de-duplicated snapshots until the job reaches a terminal
    /// state. The watcher polls the store; the channel closing ends the
    /// client's stream.
    fn watch(&self, job_id: &str) -> Reply {
        if self.state.store.get(job_id).is_none() {
            return Reply::Single(Response::Error {
                message: format!("Job not found: {}", job_id),
            });
        }

        let (tx, rx) = mpsc::channel(16);
        let mut watcher = ProgressWatcher::new(self.state.store.clone(), job_id);
        tokio::spawn(async move {
            while let Some(job) = watcher.next().await {
                if tx.send(Response::Event { job }).await.is_err() {
                    // Client went away; stop watching.
                    break;
                }
            }
        });

        Reply::Stream(rx)
    }

    /// Output path for a completed job.
    fn output(&self, job_id: &str) -> Response {
        let Some(job) = self.state.store.get(job_id) else {
            return Response::Error {
                message: format!("Job not found: {}", job_id),
            };
        };

        if job.status != JobStatus::Completed {
            return Response::Error {
                message: "Job is not completed yet".to_string(),
            };
        }

        match job.output_file {
            Some(path) if path.is_file() => Response::Output { path },
            _ => Response::Error {
                message: "Output file not found".to_string(),
            },
        }
    }

    /// Remove a job's record and working storage, unconditionally.
    fn cleanup(&self, job_id: &str) -> Response {
        cleanup_job(job_id);
        self.state.store.remove(job_id);
        Response::Ok
    }

    fn health(&self) -> Response {
        Response::Health {
            ffmpeg_available: check_ffmpeg(&self.state.ffmpeg),
        }
    }

    fn languages(&self) -> Response {
        Response::Languages {
            languages: list_languages().iter().map(LanguageEntry::from).collect(),
        }
    }
}

#[async_trait::async_trait]
impl CommandHandler for DaemonCommandHandler {
    async fn handle(&self, command: Command) -> Reply {
        match command {
            Command::Submit { source, language } => {
                Reply::Single(self.submit(&source, &language))
            }
            Command::Status { job_id } => Reply::Single(self.status(&job_id)),
            Command::Watch { job_id } => self.watch(&job_id),
            Command::Output { job_id } => Reply::Single(self.output(&job_id)),
            Command::Cleanup { job_id } => Reply::Single(self.cleanup(&job_id)),
            Command::Health => Reply::Single(self.health()),
            Command::Languages => Reply::Single(self.languages()),
            Command::Shutdown => {
                self.state.shutdown.notify_one();
                Reply::Single(Response::Ok)
            }
        }
    }
}
