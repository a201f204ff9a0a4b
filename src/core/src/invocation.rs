//! Invocation assembly for both dispatch modes.
//!
//! Batch runs become a `docker run` argument list. Interactive runs become
//! a structured create request for the engine's management API. Building
//! is pure: host paths are made absolute against the working directory
//! the builder was created with, never by asking the filesystem.

use std::path::{Component, Path, PathBuf};

use crate::config::{Entrypoint, InvocationOptions};
use crate::error::{Result, RunnerError};
use crate::image::ResolvedImage;
use crate::spec::{MountSpec, PortSpec};

/// Container engine command line.
pub const DOCKER_PROGRAM: &str = "docker";

/// Test runner started inside the batch container.
pub const BATCH_PROGRAM: &str = "wft4galaxy";

/// Mount point of the directory holding the test-suite file.
pub const CONTAINER_INPUT_DIR: &str = "/data_input";

/// Mount point of the directory holding the output folder.
pub const CONTAINER_OUTPUT_DIR: &str = "/data_output";

/// Container environment variable carrying the server URL.
pub const ENV_SERVER_URL: &str = "SERVER_URL";

/// Container environment variable carrying the API key.
pub const ENV_API_KEY: &str = "API_KEY";

/// External command for a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl BatchCommand {
    /// Space-joined rendering, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Create request for an interactive container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub image: String,
    pub command: Vec<String>,
    /// `KEY=VALUE` entries
    pub env: Vec<String>,
    pub mounts: Vec<MountSpec>,
    pub ports: Vec<PortSpec>,
    pub tty: bool,
    pub stdin_open: bool,
}

/// Fully materialized invocation handed to a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Batch(BatchCommand),
    Interactive(CreateRequest),
}

impl Invocation {
    pub fn is_interactive(&self) -> bool {
        matches!(self, Invocation::Interactive(_))
    }
}

/// Builds invocations relative to a fixed host working directory.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    working_dir: PathBuf,
    program: String,
}

impl CommandBuilder {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            program: DOCKER_PROGRAM.to_string(),
        }
    }

    /// Use `program` instead of `docker` for batch runs.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Build the invocation matching `options.entrypoint`.
    pub fn build(
        &self,
        options: &InvocationOptions,
        image: &ResolvedImage,
        mounts: &[MountSpec],
        ports: &[PortSpec],
    ) -> Result<Invocation> {
        if options.is_interactive() {
            self.build_interactive(options, image, mounts, ports)
                .map(Invocation::Interactive)
        } else {
            self.build_batch(options, image, mounts, ports).map(Invocation::Batch)
        }
    }

    /// `docker run` argument list for the test runner.
    ///
    /// Argument order is relied on by the runner's own parser. Server URL
    /// and API key go in both as environment and as arguments.
    pub fn build_batch(
        &self,
        options: &InvocationOptions,
        image: &ResolvedImage,
        mounts: &[MountSpec],
        ports: &[PortSpec],
    ) -> Result<BatchCommand> {
        if options.entrypoint != Entrypoint::Runtest {
            return Err(RunnerError::InvalidMode(format!(
                "the '{}' entrypoint cannot be run in batch mode",
                options.entrypoint
            )));
        }

        let batch = &options.batch;
        let mut args: Vec<String> = vec!["run".into(), "--rm".into(), "-i".into()];

        for mount in mounts.iter().cloned().chain(self.implicit_mounts(options)) {
            args.push("-v".into());
            args.push(mount.to_string());
        }
        for port in ports {
            args.push("-p".into());
            args.push(port.to_string());
        }
        for entry in environment(options) {
            args.push("-e".into());
            args.push(entry);
        }

        args.push(image.full_reference.clone());
        args.push(BATCH_PROGRAM.into());

        if batch.enable_logger {
            args.push("--enable-logger".into());
        }
        if options.debug {
            args.push("--debug".into());
        }
        args.extend([
            "--server".to_string(),
            options.server_url.clone(),
            "--api-key".to_string(),
            options.api_key.clone(),
        ]);
        args.push("-f".into());
        args.push(container_path(CONTAINER_INPUT_DIR, &batch.config_file));
        args.push("-o".into());
        args.push(container_path(CONTAINER_OUTPUT_DIR, &batch.output));
        if batch.disable_cleanup {
            args.push("--disable-cleanup".into());
        }
        if batch.disable_assertions {
            args.push("--disable-assertions".into());
        }
        args.extend(options.extra_args.iter().cloned());

        Ok(BatchCommand {
            program: self.program.clone(),
            args,
        })
    }

    /// Create request for a shell, REPL or notebook session.
    pub fn build_interactive(
        &self,
        options: &InvocationOptions,
        image: &ResolvedImage,
        mounts: &[MountSpec],
        ports: &[PortSpec],
    ) -> Result<CreateRequest> {
        if !options.is_interactive() {
            return Err(RunnerError::InvalidMode(format!(
                "the '{}' entrypoint cannot be used in interactive mode",
                options.entrypoint
            )));
        }

        Ok(CreateRequest {
            image: image.full_reference.clone(),
            command: vec![
                options.entrypoint.name().to_string(),
                "--server".to_string(),
                options.server_url.clone(),
                "--api-key".to_string(),
                options.api_key.clone(),
            ],
            env: environment(options),
            mounts: mounts.iter().cloned().chain(self.implicit_mounts(options)).collect(),
            ports: ports.to_vec(),
            tty: true,
            stdin_open: true,
        })
    }

    /// Mounts for the directories containing the test-suite file and the
    /// output folder.
    pub fn implicit_mounts(&self, options: &InvocationOptions) -> Vec<MountSpec> {
        vec![
            MountSpec::new(self.parent_dir(&options.batch.config_file), CONTAINER_INPUT_DIR),
            MountSpec::new(self.parent_dir(&options.batch.output), CONTAINER_OUTPUT_DIR),
        ]
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        };
        joined
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }

    fn parent_dir(&self, path: &Path) -> String {
        let absolute = self.absolute(path);
        absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(absolute)
            .display()
            .to_string()
    }
}

fn environment(options: &InvocationOptions) -> Vec<String> {
    vec![
        format!("{ENV_SERVER_URL}={}", options.server_url),
        format!("{ENV_API_KEY}={}", options.api_key),
    ]
}

fn container_path(base: &str, host_path: &Path) -> String {
    match host_path.file_name() {
        Some(name) => format!("{}/{}", base, name.to_string_lossy()),
        None => base.to_string(),
    }
}
