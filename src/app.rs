//! Application-level flows behind the CLI subcommands.
//!
//! `run_dub_command` drives a full pipeline in-process (no daemon); the
//! remaining functions are thin clients talking to a running daemon over
//! the IPC socket.

use crate::acquire::{ChainAcquirer, SourceLocator};
use crate::config::Config;
use crate::error::{DubError, Result};
use crate::ipc::client::{open_watch, send_command};
use crate::ipc::protocol::{Command, Response};
use crate::ipc::server::IpcServer;
use crate::job::progress::ProgressWatcher;
use crate::job::{Job, JobStatus, JobStore};
use crate::pipeline::{Collaborators, Orchestrator};
use crate::workspace::cleanup_job;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Progress bar for job snapshots. Hidden in quiet mode.
fn job_progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(100);
    pb.set_style(
        // SAFETY: hardcoded template string — always valid
        #[allow(clippy::expect_used)]
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .expect("hardcoded progress bar template")
            .progress_chars("#>-"),
    );
    pb
}

fn apply_snapshot(pb: &ProgressBar, job: &Job) {
    pb.set_position(job.progress as u64);
    pb.set_message(job.message.clone());
}

/// Run the dub command: acquire → separate → transcribe → translate →
/// synthesize → mix, all in this process.
///
/// # Arguments
/// * `config` - Base configuration (CLI overrides already applied)
/// * `source` - Source URL or local video file
/// * `language` - Target language name
/// * `output` - Optional path to copy the finished video to
/// * `keep_workdir` - Keep the job workspace instead of cleaning it up
/// * `quiet` - Suppress status output
/// * `verbose` - Verbosity level (>= 1 enables per-strategy status lines)
///
/// # Returns
/// Path of the finished video on success.
pub async fn run_dub_command(
    config: Config,
    source: &str,
    language: &str,
    output: Option<PathBuf>,
    keep_workdir: bool,
    quiet: bool,
    verbose: u8,
) -> Result<PathBuf> {
    let source = SourceLocator::parse(source)?;

    let store = JobStore::new();
    let mut collaborators = Collaborators::from_config(&config);
    if verbose > 0 {
        collaborators.acquirer = Arc::new(
            ChainAcquirer::new(config.acquire.clone(), &config.tools).with_verbose(true),
        );
    }
    let orchestrator = Orchestrator::new(store.clone(), collaborators);
    let job_id = orchestrator.submit(source, language);

    if !quiet {
        eprintln!("Job {} started.", job_id);
    }

    let pb = job_progress_bar(quiet);
    let mut watcher = ProgressWatcher::new(store.clone(), &job_id);
    let mut last: Option<Job> = None;
    while let Some(job) = watcher.next().await {
        apply_snapshot(&pb, &job);
        last = Some(job);
    }

    let finished = last.ok_or_else(|| DubError::JobNotFound {
        id: job_id.clone(),
    })?;

    match finished.status {
        JobStatus::Completed => {
            pb.finish_with_message("Dubbing complete");
            let produced = finished.output_file.ok_or_else(|| {
                DubError::Other("completed job has no output file".to_string())
            })?;

            // Without --output the result stays in the workspace, so the
            // workspace must survive regardless of --keep-workdir.
            let final_path = if let Some(dest) = output {
                std::fs::copy(&produced, &dest)?;
                if !keep_workdir {
                    cleanup_job(&job_id);
                }
                dest
            } else {
                produced
            };

            if !quiet {
                eprintln!("{} {}", "Output:".green().bold(), final_path.display());
            }
            Ok(final_path)
        }
        _ => {
            pb.abandon_with_message("Dubbing failed");
            Err(DubError::Other(
                finished
                    .error
                    .unwrap_or_else(|| "job failed without an error message".to_string()),
            ))
        }
    }
}

/// Resolve the daemon socket path: CLI flag, then config, then default.
pub fn resolve_socket(cli_socket: Option<PathBuf>, config: &Config) -> PathBuf {
    cli_socket
        .or_else(|| config.daemon.socket.clone())
        .unwrap_or_else(IpcServer::default_socket_path)
}

/// Submit a job to a running daemon and print its id.
pub async fn submit_remote(socket: &Path, source: &str, language: &str) -> Result<String> {
    match send_command(
        socket,
        Command::Submit {
            source: source.to_string(),
            language: language.to_string(),
        },
    )
    .await?
    {
        Response::Accepted { job_id } => {
            println!("{}", job_id);
            Ok(job_id)
        }
        Response::Error { message } => Err(DubError::Other(message)),
        other => Err(unexpected(other)),
    }
}

/// Print a job's current status.
pub async fn status_remote(socket: &Path, job_id: &str) -> Result<()> {
    match send_command(
        socket,
        Command::Status {
            job_id: job_id.to_string(),
        },
    )
    .await?
    {
        Response::Status { job } => {
            print_job(&job);
            Ok(())
        }
        Response::Error { message } => Err(DubError::Other(message)),
        other => Err(unexpected(other)),
    }
}

/// Follow a job's progress until it reaches a terminal state.
pub async fn watch_remote(socket: &Path, job_id: &str, quiet: bool) -> Result<()> {
    let mut events = open_watch(socket, job_id).await?;
    let pb = job_progress_bar(quiet);

    let mut last: Option<Job> = None;
    while let Some(response) = events.next().await? {
        match response {
            Response::Event { job } => {
                apply_snapshot(&pb, &job);
                last = Some(job);
            }
            Response::Error { message } => {
                pb.abandon();
                return Err(DubError::Other(message));
            }
            other => return Err(unexpected(other)),
        }
    }

    match last {
        Some(job) if job.status == JobStatus::Completed => {
            pb.finish_with_message("Dubbing complete");
            if let Some(path) = job.output_file {
                println!("{}", path.display());
            }
            Ok(())
        }
        Some(job) => {
            pb.abandon_with_message("Dubbing failed");
            Err(DubError::Other(job.error.unwrap_or_else(|| {
                "job failed without an error message".to_string()
            })))
        }
        None => Err(DubError::Other("watch stream ended without events".to_string())),
    }
}

/// Print the finished output file path.
pub async fn output_remote(socket: &Path, job_id: &str) -> Result<()> {
    match send_command(
        socket,
        Command::Output {
            job_id: job_id.to_string(),
        },
    )
    .await?
    {
        Response::Output { path } => {
            println!("{}", path.display());
            Ok(())
        }
        Response::Error { message } => Err(DubError::Other(message)),
        other => Err(unexpected(other)),
    }
}

/// Remove a job's record and working storage.
pub async fn cleanup_remote(socket: &Path, job_id: &str, quiet: bool) -> Result<()> {
    match send_command(
        socket,
        Command::Cleanup {
            job_id: job_id.to_string(),
        },
    )
    .await?
    {
        Response::Ok => {
            if !quiet {
                eprintln!("Cleaned up job {}.", job_id);
            }
            Ok(())
        }
        Response::Error { message } => Err(DubError::Other(message)),
        other => Err(unexpected(other)),
    }
}

/// Print the supported target languages.
pub async fn languages_remote(socket: &Path) -> Result<()> {
    match send_command(socket, Command::Languages).await? {
        Response::Languages { languages } => {
            for entry in languages {
                println!(
                    "{:<12} {:<6} {}",
                    entry.name.bold(),
                    entry.code,
                    entry.voice.dimmed()
                );
            }
            Ok(())
        }
        Response::Error { message } => Err(DubError::Other(message)),
        other => Err(unexpected(other)),
    }
}

/// Print the local language catalog (no daemon required).
pub fn languages_local() {
    for info in crate::voices::list_languages() {
        println!(
            "{:<12} {:<6} {}",
            info.name.bold(),
            info.code,
            info.voice.dimmed()
        );
    }
}

/// Check daemon health.
pub async fn health_remote(socket: &Path) -> Result<()> {
    match send_command(socket, Command::Health).await? {
        Response::Health { ffmpeg_available } => {
            if ffmpeg_available {
                println!("{}", "ok".green());
            } else {
                println!("{}: ffmpeg not found", "degraded".yellow());
            }
            Ok(())
        }
        Response::Error { message } => Err(DubError::Other(message)),
        other => Err(unexpected(other)),
    }
}

/// Ask a running daemon to shut down.
pub async fn shutdown_remote(socket: &Path, quiet: bool) -> Result<()> {
    match send_command(socket, Command::Shutdown).await? {
        Response::Ok => {
            if !quiet {
                eprintln!("Daemon shutting down.");
            }
            Ok(())
        }
        Response::Error { message } => Err(DubError::Other(message)),
        other => Err(unexpected(other)),
    }
}

fn unexpected(response: Response) -> DubError {
    DubError::IpcProtocol {
        message: format!("unexpected response: {:?}", response),
    }
}

fn print_job(job: &Job) {
    println!("id:       {}", job.id);
    println!("status:   {:?}", job.status);
    println!("step:     {}", job.step);
    println!("progress: {}%", job.progress);
    println!("message:  {}", job.message);
    if let Some(error) = &job.error {
        println!("error:    {}", error.red());
    }
    if let Some(output) = &job.output_file {
        println!("output:   {}", output.display());
    }
}
