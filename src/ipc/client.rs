//! IPC client for sending commands to the daemon.

use crate::error::{DubError, Result};
use crate::ipc::protocol::{Command, Response};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};

async fn connect_and_send(socket_path: &Path, command: &Command) -> Result<UnixStream> {
    let stream = UnixStream::connect(socket_path)
        .await
        .map_err(|e| DubError::IpcConnection {
            message: format!("Failed to connect to daemon: {}", e),
        })?;

    let command_json = command.to_json().map_err(|e| DubError::IpcProtocol {
        message: format!("Failed to serialize command: {}", e),
    })?;

    let (read_half, mut write_half) = stream.into_split();
    write_half
        .write_all(command_json.as_bytes())
        .await
        .map_err(|e| DubError::IpcConnection {
            message: format!("Failed to write command: {}", e),
        })?;
    write_half
        .write_all(b"\n")
        .await
        .map_err(|e| DubError::IpcConnection {
            message: format!("Failed to write newline: {}", e),
        })?;
    write_half
        .flush()
        .await
        .map_err(|e| DubError::IpcConnection {
            message: format!("Failed to flush writer: {}", e),
        })?;

    read_half
        .reunite(write_half)
        .map_err(|e| DubError::IpcConnection {
            message: format!("Failed to reunite stream halves: {}", e),
        })
}

/// Send a command to the daemon and read its single response.
///
/// # Errors
/// Returns `DubError::IpcConnection` if connection fails and
/// `DubError::IpcProtocol` if serialization/deserialization fails.
pub async fn send_command(socket_path: &Path, command: Command) -> Result<Response> {
    let stream = connect_and_send(socket_path, &command).await?;
    let mut reader = BufReader::new(stream);

    let mut response_line = String::new();
    reader
        .read_line(&mut response_line)
        .await
        .map_err(|e| DubError::IpcConnection {
            message: format!("Failed to read response: {}", e),
        })?;

    Response::from_json(response_line.trim()).map_err(|e| DubError::IpcProtocol {
        message: format!("Failed to parse response: {}", e),
    })
}

/// Open stream of watch events for a job.
pub struct EventStream {
    reader: BufReader<OwnedReadHalf>,
    // Keeps the write half alive; dropping it would close the connection.
    _writer: OwnedWriteHalf,
}

impl EventStream {
    /// Reads the next response, or `None` when the daemon closes the
    /// stream (terminal snapshot delivered).
    pub async fn next(&mut self) -> Result<Option<Response>> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| DubError::IpcConnection {
                message: format!("Failed to read event: {}", e),
            })?;

        if read == 0 {
            return Ok(None);
        }

        let response = Response::from_json(line.trim()).map_err(|e| DubError::IpcProtocol {
            message: format!("Failed to parse event: {}", e),
        })?;
        Ok(Some(response))
    }
}

/// Subscribe to a job's progress events.
pub async fn open_watch(socket_path: &Path, job_id: &str) -> Result<EventStream> {
    let command = Command::Watch {
        job_id: job_id.to_string(),
    };
    let stream = connect_and_send(socket_path, &command).await?;
    let (read_half, write_half) = stream.into_split();
    Ok(EventStream {
        reader: BufReader::new(read_half),
        _writer: write_half,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_command_without_daemon_fails() {
        let result = send_command(Path::new("/tmp/polydub-nonexistent.sock"), Command::Health).await;
        assert!(matches!(result, Err(DubError::IpcConnection { .. })));
    }

    #[tokio::test]
    async fn test_open_watch_without_daemon_fails() {
        let result = open_watch(Path::new("/tmp/polydub-nonexistent.sock"), "j1").await;
        assert!(result.is_err());
    }
}
