//! Daemon mode for polydub - long-running dubbing service behind a Unix
//! socket.
//!
//! The daemon owns the job store and one orchestrator; every IPC submit
//! spawns an independent pipeline run. There is no admission control:
//! concurrent job count is unbounded.

pub mod handler;

use crate::config::Config;
use crate::error::Result;
use crate::ipc::server::IpcServer;
use crate::job::JobStore;
use crate::pipeline::Orchestrator;
use crate::tools::check_ffmpeg;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;

/// Daemon state shared with the command handler.
pub struct DaemonState {
    /// Orchestrator (owns the collaborator set; the store is inside)
    pub orchestrator: Orchestrator,
    /// Job registry handle, for read paths
    pub store: JobStore,
    /// ffmpeg binary, for health checks
    pub ffmpeg: String,
    /// Raised by the Shutdown command
    pub shutdown: Arc<Notify>,
}

impl DaemonState {
    /// Creates daemon state from configuration.
    pub fn new(config: &Config) -> Self {
        let store = JobStore::new();
        let orchestrator = Orchestrator::from_config(store.clone(), config);
        Self {
            orchestrator,
            store,
            ffmpeg: config.tools.ffmpeg.clone(),
            shutdown: Arc::new(Notify::new()),
        }
    }
}

/// Run the daemon: bind the socket, serve commands, wait for shutdown.
///
/// # Arguments
/// * `config` - Configuration
/// * `socket_path` - Socket override (CLI flag beats config beats default)
/// * `quiet` - Suppress status messages
///
/// # Returns
/// Ok(()) on graceful shutdown, error otherwise
pub async fn run_daemon(config: Config, socket_path: Option<PathBuf>, quiet: bool) -> Result<()> {
    if !check_ffmpeg(&config.tools.ffmpeg) {
        eprintln!(
            "polydub: warning: '{}' not found on PATH — jobs will fail at acquisition",
            config.tools.ffmpeg
        );
    }

    let socket_path = socket_path
        .or_else(|| config.daemon.socket.clone())
        .unwrap_or_else(IpcServer::default_socket_path);

    let state = Arc::new(DaemonState::new(&config));
    let shutdown = Arc::clone(&state.shutdown);

    let server = Arc::new(IpcServer::new(socket_path)?);

    if !quiet {
        eprintln!(
            "IPC server listening at: {}",
            server.socket_path().display()
        );
        eprintln!("Daemon ready.");
    }

    let handler = handler::DaemonCommandHandler::new(state);

    // Start IPC server in background task
    let server_clone = Arc::clone(&server);
    let server_handle = tokio::spawn(async move { server_clone.start(handler).await });

    // Wait for SIGTERM, SIGINT or a Shutdown command
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            if !quiet {
                eprintln!("\nReceived SIGINT, shutting down...");
            }
        }
        res = wait_for_sigterm() => {
            if let Err(e) = res {
                eprintln!("Error setting up signal handler: {}", e);
            }
            if !quiet {
                eprintln!("\nReceived SIGTERM, shutting down...");
            }
        }
        _ = shutdown.notified() => {
            if !quiet {
                eprintln!("Shutdown requested, shutting down...");
            }
        }
    }

    // Stop IPC server
    server.stop().await?;

    if let Err(e) = server_handle.await {
        eprintln!("polydub: daemon server task failed: {}", e);
    }

    if !quiet {
        eprintln!("Daemon stopped.");
    }

    Ok(())
}

/// Wait for SIGTERM signal (used by systemd).
#[cfg(unix)]
async fn wait_for_sigterm() -> Result<()> {
    use crate::error::DubError;
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| DubError::Other(format!("Failed to register SIGTERM handler: {}", e)))?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> Result<()> {
    // On non-Unix, just wait forever (Ctrl+C will still work)
    std::future::pending::<()>().await
}
