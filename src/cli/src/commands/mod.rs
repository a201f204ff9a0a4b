//! CLI command definitions and dispatch.

mod interactive;
mod run;
mod runtest;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use wft_runner_core::error::Result;
use wft_runner_core::invocation::DOCKER_PROGRAM;
use wft_runner_core::{BaseOs, Entrypoint, InvocationOptions, Properties, RunResult, ServerSettings};

pub use interactive::JupyterArgs;
pub use run::{execute, prepare, Prepared};
pub use runtest::RuntestArgs;

/// wft-runner - run workflow tests against a Galaxy server inside a container.
///
/// Without a subcommand the workflow tests are run (`runtest`).
#[derive(Parser, Debug)]
#[command(name = "wft-runner", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub runtest: RuntestArgs,
}

/// Options shared by every entrypoint.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Alternative Docker registry
    #[arg(long, global = true)]
    pub registry: Option<String>,

    /// Alternative image repository
    #[arg(long, global = true)]
    pub repository: Option<String>,

    /// Alternative image (NAME:TAG), used verbatim
    #[arg(long, global = true)]
    pub image: Option<String>,

    /// Base OS of the image
    #[arg(long, global = true, default_value = "alpine")]
    pub os: BaseOs,

    /// Use the local image without refreshing it
    #[arg(long = "local", global = true)]
    pub local: bool,

    /// Galaxy server URL (default: $GALAXY_URL)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Galaxy API key (default: $GALAXY_API_KEY)
    #[arg(long = "api-key", global = true)]
    pub api_key: Option<String>,

    /// Publish a port (host[:container]), can be repeated
    #[arg(short = 'p', long = "port", global = true)]
    pub ports: Vec<String>,

    /// Bind mount a volume (host:container), can be repeated
    #[arg(short = 'v', long = "volume", global = true)]
    pub volumes: Vec<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Properties file with image defaults
    #[arg(long, global = true)]
    pub properties: Option<PathBuf>,

    /// Container engine command line (e.g. podman)
    #[arg(long, global = true, default_value = DOCKER_PROGRAM)]
    pub engine: String,
}

/// Available entrypoints.
#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = Entrypoint::Runtest.description())]
    Runtest(RuntestArgs),
    #[command(about = Entrypoint::Bash.description())]
    Bash,
    #[command(about = Entrypoint::Ipython.description())]
    Ipython,
    #[command(about = Entrypoint::Jupyter.description())]
    Jupyter(JupyterArgs),
}

impl Cli {
    /// Entrypoint selected on the command line.
    pub fn entrypoint(&self) -> Entrypoint {
        match &self.command {
            None | Some(Command::Runtest(_)) => Entrypoint::Runtest,
            Some(Command::Bash) => Entrypoint::Bash,
            Some(Command::Ipython) => Entrypoint::Ipython,
            Some(Command::Jupyter(_)) => Entrypoint::Jupyter,
        }
    }

    /// Assemble invocation options, using `lookup` for environment
    /// fallbacks of the server settings.
    pub fn into_options<F>(self, lookup: F) -> Result<InvocationOptions>
    where
        F: Fn(&str) -> Option<String>,
    {
        let entrypoint = self.entrypoint();
        let global = self.global;
        let server = ServerSettings::resolve_with(global.server, global.api_key, lookup)?;

        let mut options = InvocationOptions::new(entrypoint, server);
        options.registry = global.registry;
        options.repository = global.repository;
        options.image = global.image;
        options.os = global.os;
        options.use_local_image = global.local;
        options.volumes = global.volumes;
        options.ports = global.ports;
        options.debug = global.debug;

        match self.command {
            None => self.runtest.apply(&mut options),
            Some(Command::Runtest(args)) => args.apply(&mut options),
            Some(Command::Jupyter(args)) => args.apply(&mut options),
            Some(Command::Bash) | Some(Command::Ipython) => {}
        }
        Ok(options)
    }
}

/// Dispatch a parsed CLI to the run pipeline.
pub async fn dispatch(cli: Cli) -> Result<RunResult> {
    let properties = Properties::load_or_default(cli.global.properties.as_deref())?;
    let engine = cli.global.engine.clone();
    let options = cli.into_options(|key| std::env::var(key).ok())?;
    let working_dir = std::env::current_dir()?;

    tracing::debug!(entrypoint = %options.entrypoint, engine = %engine, "Starting run");
    execute(&options, &properties, &working_dir, &engine).await
}
