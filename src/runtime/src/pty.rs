//! Pseudo-terminal bridge between the local terminal and a container.
//!
//! - container output → stdout
//! - stdin → container input
//! - SIGWINCH → container TTY resize
//!
//! The local terminal is in raw mode for the whole session and restored
//! on every exit path.

use std::io::IsTerminal;
use std::pin::Pin;

use bollard::container::{LogOutput, ResizeContainerTtyOptions};
use bollard::Docker;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use wft_runner_core::error::{Result, RunnerError};

type OutputStream = Pin<Box<dyn Stream<Item = std::result::Result<LogOutput, bollard::errors::Error>> + Send>>;
type InputSink = Pin<Box<dyn AsyncWrite + Send>>;

/// Raw-mode terminal, restored when dropped.
struct RawModeGuard {
    enabled: bool,
}

impl RawModeGuard {
    fn enable() -> Result<Self> {
        if !std::io::stdin().is_terminal() {
            return Ok(Self { enabled: false });
        }
        crossterm::terminal::enable_raw_mode()?;
        Ok(Self { enabled: true })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.enabled {
            let _ = crossterm::terminal::disable_raw_mode();
        }
    }
}

/// Input forwarder, aborted when the session ends or is dropped.
struct ForwarderGuard(tokio::task::JoinHandle<()>);

impl Drop for ForwarderGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Relay the attached streams until the container closes its output.
pub(crate) async fn run_session(
    docker: Docker,
    id: String,
    mut output: OutputStream,
    input: InputSink,
) -> Result<()> {
    let _raw = RawModeGuard::enable()?;

    resize(&docker, &id).await;
    let _forwarder = ForwarderGuard(tokio::spawn(forward_input(docker, id, input)));

    let mut stdout = tokio::io::stdout();
    loop {
        match output.next().await {
            Some(Ok(chunk)) => {
                if let Err(e) = stdout.write_all(&chunk.into_bytes()).await {
                    break Err(RunnerError::Io(e));
                }
                let _ = stdout.flush().await;
            }
            Some(Err(e)) => break Err(RunnerError::Engine(e.to_string())),
            None => break Ok(()),
        }
    }
}

/// stdin + window changes → container.
async fn forward_input(docker: Docker, id: String, mut input: InputSink) {
    let mut stdin = tokio::io::stdin();
    let mut buf = [0u8; 4096];

    #[cfg(unix)]
    let mut sigwinch =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::window_change()).ok();

    loop {
        #[cfg(unix)]
        let window_changed = async {
            match sigwinch {
                Some(ref mut sig) => {
                    sig.recv().await;
                }
                None => std::future::pending().await,
            }
        };
        #[cfg(not(unix))]
        let window_changed = std::future::pending::<()>();

        tokio::select! {
            result = stdin.read(&mut buf) => {
                match result {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if input.write_all(&buf[..n]).await.is_err() {
                            break;
                        }
                        let _ = input.flush().await;
                    }
                }
            },
            _ = window_changed => resize(&docker, &id).await,
        }
    }
}

/// Match the container TTY to the local terminal size.
async fn resize(docker: &Docker, id: &str) {
    let Ok((width, height)) = crossterm::terminal::size() else {
        return;
    };
    let options = ResizeContainerTtyOptions { width, height };
    if let Err(e) = docker.resize_container_tty(id, options).await {
        tracing::debug!(container = %id, error = %e, "TTY resize failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_forwarder_aborted_on_drop() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let guard = ForwarderGuard(tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        }));

        drop(guard);

        // The task's state is dropped with it, closing the channel.
        let closed = tokio::time::timeout(Duration::from_secs(5), rx).await.unwrap();
        assert!(closed.is_err());
    }

    #[tokio::test]
    async fn test_forwarder_aborted_when_session_future_dropped() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let session = async move {
            let _forwarder = ForwarderGuard(tokio::spawn(async move {
                let _tx = tx;
                std::future::pending::<()>().await;
            }));
            std::future::pending::<()>().await;
        };

        tokio::select! {
            _ = session => unreachable!(),
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
        }

        let closed = tokio::time::timeout(Duration::from_secs(5), rx).await.unwrap();
        assert!(closed.is_err());
    }
}
