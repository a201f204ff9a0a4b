//! Dispatch strategies for the two run modes.
//!
//! - `NonInteractive`: Building → Running → Terminated
//! - `Interactive`: Building → Created → Attached → Removed
//!
//! Both refresh the image first unless a local image was requested.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use wft_runner_core::error::{Result, RunnerError};
use wft_runner_core::{Invocation, InvocationOptions, ResolvedImage, RunResult};

use crate::engine::ContainerEngine;
use crate::pull::{refresh_image, ImageRefresher};

/// Batch runs through the engine's command line.
pub struct NonInteractive {
    refresher: Arc<dyn ImageRefresher>,
}

impl NonInteractive {
    pub fn new(refresher: Arc<dyn ImageRefresher>) -> Self {
        Self { refresher }
    }

    /// Run until the child exits or the user interrupts.
    pub async fn run(
        &self,
        options: &InvocationOptions,
        image: &ResolvedImage,
        invocation: &Invocation,
    ) -> Result<RunResult> {
        self.run_until(options, image, invocation, crate::signal::interrupted())
            .await
    }

    /// Run until the child exits or `interrupt` resolves.
    pub async fn run_until<F>(
        &self,
        options: &InvocationOptions,
        image: &ResolvedImage,
        invocation: &Invocation,
        interrupt: F,
    ) -> Result<RunResult>
    where
        F: Future<Output = ()>,
    {
        let command = match invocation {
            Invocation::Batch(command) if !options.is_interactive() => command,
            _ => {
                return Err(RunnerError::InvalidMode(format!(
                    "the '{}' entrypoint cannot be run non-interactively",
                    options.entrypoint
                )))
            }
        };

        refresh_image(self.refresher.as_ref(), image).await;

        tracing::debug!(args = ?command.args, "Command parts");
        tracing::debug!("Command string: {}", command.command_line());

        crate::process::run_to_completion(command, interrupt).await
    }
}

/// Interactive sessions through the engine's management interface.
pub struct Interactive {
    refresher: Arc<dyn ImageRefresher>,
    engine: Arc<dyn ContainerEngine>,
}

impl Interactive {
    pub fn new(refresher: Arc<dyn ImageRefresher>, engine: Arc<dyn ContainerEngine>) -> Self {
        Self { refresher, engine }
    }

    /// Run until the session ends or the user interrupts.
    pub async fn run(
        &self,
        options: &InvocationOptions,
        image: &ResolvedImage,
        invocation: &Invocation,
    ) -> Result<RunResult> {
        self.run_until(options, image, invocation, crate::signal::interrupted())
            .await
    }

    /// Run until the session ends or `interrupt` resolves.
    ///
    /// Once created, the container is removed exactly once whatever the
    /// session outcome, including a panic inside the engine.
    pub async fn run_until<F>(
        &self,
        options: &InvocationOptions,
        image: &ResolvedImage,
        invocation: &Invocation,
        interrupt: F,
    ) -> Result<RunResult>
    where
        F: Future<Output = ()>,
    {
        let request = match invocation {
            Invocation::Interactive(request) if options.is_interactive() => request,
            _ => {
                return Err(RunnerError::InvalidMode(format!(
                    "you cannot use the entrypoint '{}' in interactive mode",
                    options.entrypoint
                )))
            }
        };

        refresh_image(self.refresher.as_ref(), image).await;

        let id = self.engine.create(request).await?;
        tracing::info!(container = %id, "Started container");

        let session = AssertUnwindSafe(self.engine.attach(&id)).catch_unwind();
        let end = tokio::select! {
            attached = session => SessionEnd::Finished(attached),
            _ = interrupt => SessionEnd::Interrupted,
        };

        match self.engine.remove(&id).await {
            Ok(()) => tracing::info!(container = %id, "Removed container"),
            Err(e) => tracing::error!(container = %id, error = %e, "Unable to remove container"),
        }

        match end {
            SessionEnd::Finished(Ok(Ok(code))) => Ok(RunResult::completed(code)),
            SessionEnd::Finished(Ok(Err(e))) => Err(e),
            SessionEnd::Finished(Err(panic)) => std::panic::resume_unwind(panic),
            SessionEnd::Interrupted => {
                tracing::warn!(container = %id, "Interactive session interrupted by user");
                Ok(RunResult::interrupted())
            }
        }
    }
}

enum SessionEnd {
    Finished(std::thread::Result<Result<i32>>),
    Interrupted,
}

/// The dispatch strategy selected for a run.
pub enum Dispatcher {
    NonInteractive(NonInteractive),
    Interactive(Interactive),
}

impl Dispatcher {
    /// Select the strategy for `options`, connecting to the engine's
    /// management interface when a session is needed.
    pub async fn connect(options: &InvocationOptions, refresher: Arc<dyn ImageRefresher>) -> Result<Self> {
        if options.is_interactive() {
            let engine = connect_engine().await?;
            Ok(Dispatcher::Interactive(Interactive::new(refresher, engine)))
        } else {
            Ok(Dispatcher::NonInteractive(NonInteractive::new(refresher)))
        }
    }

    pub async fn run(
        &self,
        options: &InvocationOptions,
        image: &ResolvedImage,
        invocation: &Invocation,
    ) -> Result<RunResult> {
        match self {
            Dispatcher::NonInteractive(runner) => runner.run(options, image, invocation).await,
            Dispatcher::Interactive(runner) => runner.run(options, image, invocation).await,
        }
    }
}

#[cfg(feature = "interactive")]
async fn connect_engine() -> Result<Arc<dyn ContainerEngine>> {
    let engine = crate::docker::DockerEngine::connect().await?;
    Ok(Arc::new(engine))
}

#[cfg(not(feature = "interactive"))]
async fn connect_engine() -> Result<Arc<dyn ContainerEngine>> {
    Err(RunnerError::EnvironmentUnavailable {
        message: "interactive sessions are not supported by this build".to_string(),
        hint: "Rebuild wft-runner with `--features interactive` to enable the bash, ipython and jupyter entrypoints"
            .to_string(),
    })
}
