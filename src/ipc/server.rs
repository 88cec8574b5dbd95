//! Async Unix socket IPC server for daemon control.

use crate::error::{DubError, Result};
use crate::ipc::protocol::{Command, Response};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex, mpsc};

/// What a handler gives back for one command: a single response or a
/// stream of them (watch subscriptions). A stream's channel closing ends
/// the client connection.
pub enum Reply {
    Single(Response),
    Stream(mpsc::Receiver<Response>),
}

/// Handler trait for processing IPC commands.
#[async_trait::async_trait]
pub trait CommandHandler: Send + Sync {
    /// Handle a command and return a reply.
    async fn handle(&self, command: Command) -> Reply;
}

/// State for managing server shutdown.
#[derive(Debug, Clone)]
struct ServerState {
    shutdown: Arc<Mutex<bool>>,
}

impl ServerState {
    fn new() -> Self {
        Self {
            shutdown: Arc::new(Mutex::new(false)),
        }
    }

    async fn is_shutdown(&self) -> bool {
        *self.shutdown.lock().await
    }

    async fn set_shutdown(&self) {
        *self.shutdown.lock().await = true;
    }
}

/// IPC server for handling daemon control commands via Unix socket.
pub struct IpcServer {
    socket_path: PathBuf,
    state: ServerState,
}

impl IpcServer {
    /// Create a new IPC server bound to the specified socket path.
    pub fn new(socket_path: PathBuf) -> Result<Self> {
        Ok(Self {
            socket_path,
            state: ServerState::new(),
        })
    }

    /// Get the socket path this server is using.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Get the default socket path based on XDG_RUNTIME_DIR or fallback.
    pub fn default_socket_path() -> PathBuf {
        if let Ok(xdg_runtime) = std::env::var("XDG_RUNTIME_DIR") {
            PathBuf::from(xdg_runtime).join("polydub.sock")
        } else {
            PathBuf::from("/tmp/polydub.sock")
        }
    }

    /// Start the IPC server and handle incoming connections.
    pub async fn start<H>(&self, handler: H) -> Result<()>
    where
        H: CommandHandler + 'static,
    {
        // Clean up any existing socket file
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| DubError::IpcSocket {
                message: format!("Failed to remove existing socket: {}", e),
            })?;
        }

        // Bind to the socket
        let listener = UnixListener::bind(&self.socket_path).map_err(|e| DubError::IpcSocket {
            message: format!("Failed to bind to socket: {}", e),
        })?;

        let handler = Arc::new(handler);

        loop {
            // Check if shutdown was requested
            if self.state.is_shutdown().await {
                break;
            }

            // Accept connection with timeout to check for shutdown
            let accept_result =
                tokio::time::timeout(tokio::time::Duration::from_millis(100), listener.accept())
                    .await;

            match accept_result {
                Ok(Ok((stream, _))) => {
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, handler).await {
                            eprintln!("polydub: error handling IPC client: {}", e);
                        }
                    });
                }
                Ok(Err(e)) => {
                    return Err(DubError::IpcConnection {
                        message: format!("Failed to accept connection: {}", e),
                    });
                }
                Err(_) => {
                    // Timeout - check shutdown flag again
                    continue;
                }
            }
        }

        Ok(())
    }

    /// Stop the IPC server and clean up the socket file.
    pub async fn stop(&self) -> Result<()> {
        self.state.set_shutdown().await;

        // Clean up socket file
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| DubError::IpcSocket {
                message: format!("Failed to remove socket file: {}", e),
            })?;
        }

        Ok(())
    }
}

/// Writes one response as a JSON line.
async fn write_response(
    writer: &mut (impl AsyncWriteExt + Unpin),
    response: &Response,
) -> Result<()> {
    let json = response.to_json().map_err(|e| DubError::IpcProtocol {
        message: format!("Failed to serialize response: {}", e),
    })?;

    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| DubError::IpcConnection {
            message: format!("Failed to write to client: {}", e),
        })?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| DubError::IpcConnection {
            message: format!("Failed to write newline to client: {}", e),
        })?;
    writer.flush().await.map_err(|e| DubError::IpcConnection {
        message: format!("Failed to flush writer: {}", e),
    })?;
    Ok(())
}

/// Handle a single client connection.
async fn handle_client<H>(stream: UnixStream, handler: Arc<H>) -> Result<()>
where
    H: CommandHandler,
{
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    // Read command (one line JSON)
    reader
        .read_line(&mut line)
        .await
        .map_err(|e| DubError::IpcConnection {
            message: format!("Failed to read from client: {}", e),
        })?;

    // Parse command; a malformed line gets an error response rather than
    // a dropped connection.
    let command = match Command::from_json(line.trim()) {
        Ok(command) => command,
        Err(e) => {
            let response = Response::Error {
                message: format!("Invalid command: {}", e),
            };
            write_response(&mut writer, &response).await?;
            return Ok(());
        }
    };

    match handler.handle(command).await {
        Reply::Single(response) => {
            write_response(&mut writer, &response).await?;
        }
        Reply::Stream(mut events) => {
            while let Some(response) = events.recv().await {
                write_response(&mut writer, &response).await?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{Job, JobStatus};
    use tempfile::TempDir;

    struct MockCommandHandler;

    #[async_trait::async_trait]
    impl CommandHandler for MockCommandHandler {
        async fn handle(&self, command: Command) -> Reply {
            match command {
                Command::Health => Reply::Single(Response::Health {
                    ffmpeg_available: true,
                }),
                Command::Watch { job_id } => {
                    let (tx, rx) = mpsc::channel(4);
                    tokio::spawn(async move {
                        for progress in [10u8, 100] {
                            let job = Job {
                                id: job_id.clone(),
                                status: if progress == 100 {
                                    JobStatus::Completed
                                } else {
                                    JobStatus::Processing
                                },
                                step: "test".to_string(),
                                progress,
                                message: "working".to_string(),
                                error: None,
                                output_file: None,
                            };
                            if tx.send(Response::Event { job }).await.is_err() {
                                break;
                            }
                        }
                    });
                    Reply::Stream(rx)
                }
                _ => Reply::Single(Response::Ok),
            }
        }
    }

    async fn start_test_server() -> (Arc<IpcServer>, PathBuf, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        let socket = dir.path().join("test.sock");
        let server = Arc::new(IpcServer::new(socket.clone()).expect("server"));

        let server_clone = Arc::clone(&server);
        tokio::spawn(async move {
            let _ = server_clone.start(MockCommandHandler).await;
        });

        // Wait for the socket to appear
        for _ in 0..50 {
            if socket.exists() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        }

        (server, socket, dir)
    }

    #[tokio::test]
    async fn test_single_command_round_trip() {
        let (server, socket, _dir) = start_test_server().await;

        let stream = UnixStream::connect(&socket).await.expect("connect");
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        writer
            .write_all(format!("{}\n", Command::Health.to_json().expect("json")).as_bytes())
            .await
            .expect("write");

        let mut line = String::new();
        reader.read_line(&mut line).await.expect("read");
        let response = Response::from_json(line.trim()).expect("parse");
        assert_eq!(
            response,
            Response::Health {
                ffmpeg_available: true
            }
        );

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn test_watch_streams_multiple_events() {
        let (server, socket, _dir) = start_test_server().await;

        let stream = UnixStream::connect(&socket).await.expect("connect");
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let cmd = Command::Watch {
            job_id: "j1".to_string(),
        };
        writer
            .write_all(format!("{}\n", cmd.to_json().expect("json")).as_bytes())
            .await
            .expect("write");

        let mut events = Vec::new();
        let mut line = String::new();
        while reader.read_line(&mut line).await.expect("read") > 0 {
            events.push(Response::from_json(line.trim()).expect("parse"));
            line.clear();
        }

        assert_eq!(events.len(), 2);
        match &events[1] {
            Response::Event { job } => assert_eq!(job.status, JobStatus::Completed),
            other => panic!("expected Event, got {:?}", other),
        }

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn test_malformed_command_gets_error_response() {
        let (server, socket, _dir) = start_test_server().await;

        let stream = UnixStream::connect(&socket).await.expect("connect");
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        writer.write_all(b"this is not json\n").await.expect("write");

        let mut line = String::new();
        reader.read_line(&mut line).await.expect("read");
        let response = Response::from_json(line.trim()).expect("parse");
        assert!(matches!(response, Response::Error { .. }));

        server.stop().await.expect("stop");
    }
}
