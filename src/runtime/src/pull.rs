//! Best-effort image refresh.
//!
//! A refresh that fails or is interrupted never aborts the run: the
//! resolved reference is used as-is and the engine reports a missing
//! image later, if there is one.

use async_trait::async_trait;
use tokio::process::Command;
use wft_runner_core::error::{Result, RunnerError};
use wft_runner_core::invocation::DOCKER_PROGRAM;
use wft_runner_core::ResolvedImage;

/// Fetches the latest version of an image from its registry.
#[async_trait]
pub trait ImageRefresher: Send + Sync {
    async fn refresh(&self, reference: &str) -> Result<()>;
}

/// Refreshes images through `docker pull`.
#[derive(Debug, Clone)]
pub struct DockerCliRefresher {
    program: String,
}

impl DockerCliRefresher {
    pub fn new() -> Self {
        Self::with_program(DOCKER_PROGRAM)
    }

    /// Use an alternative engine command line (e.g. `podman`).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for DockerCliRefresher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageRefresher for DockerCliRefresher {
    async fn refresh(&self, reference: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(["pull", reference])
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RunnerError::Engine(format!("failed to run `{} pull`: {}", self.program, e)))?;

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    Ok(())
                } else {
                    Err(RunnerError::Engine(format!("`{} pull {}` exited with {}", self.program, reference, status)))
                }
            }
            _ = crate::signal::interrupted() => {
                let _ = child.kill().await;
                Err(RunnerError::Engine("pull interrupted by user".to_string()))
            }
        }
    }
}

/// Refresh `image` unless a local image was requested. Failures are logged.
pub async fn refresh_image(refresher: &dyn ImageRefresher, image: &ResolvedImage) {
    if !image.should_pull {
        tracing::info!(image = %image.full_reference, "Using the local version of the image");
        return;
    }

    tracing::info!(image = %image.full_reference, "Updating image");
    if let Err(e) = refresher.refresh(&image.full_reference).await {
        tracing::warn!(
            image = %image.full_reference,
            error = %e,
            "Image refresh failed, continuing with the resolved reference"
        );
    }
}
