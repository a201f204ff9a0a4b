//! Invocation options and the closed sets they are built from.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Result, RunnerError};

/// Default workflow-test suite file, relative to the working directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "workflow-test-suite.yml";

/// Default output folder, relative to the working directory.
pub const DEFAULT_OUTPUT_FOLDER: &str = "results";

/// Host environment variable consulted when `--server` is absent.
pub const SERVER_URL_ENV: &str = "GALAXY_URL";

/// Host environment variable consulted when `--api-key` is absent.
pub const API_KEY_ENV: &str = "GALAXY_API_KEY";

/// Program started inside the container for a given run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entrypoint {
    /// Non-interactive test execution
    Runtest,
    /// Bash shell
    Bash,
    /// IPython REPL
    Ipython,
    /// Jupyter notebook server
    Jupyter,
}

impl Entrypoint {
    /// All entrypoints, batch first.
    pub const ALL: [Entrypoint; 4] = [
        Entrypoint::Runtest,
        Entrypoint::Bash,
        Entrypoint::Ipython,
        Entrypoint::Jupyter,
    ];

    /// Name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Entrypoint::Runtest => "runtest",
            Entrypoint::Bash => "bash",
            Entrypoint::Ipython => "ipython",
            Entrypoint::Jupyter => "jupyter",
        }
    }

    /// One-line description for help output.
    pub fn description(&self) -> &'static str {
        match self {
            Entrypoint::Runtest => "Execute the workflow tests as entrypoint",
            Entrypoint::Bash => "Execute the Bash shell as entrypoint",
            Entrypoint::Ipython => "Execute the IPython shell as entrypoint",
            Entrypoint::Jupyter => "Execute the Jupyter server as entrypoint",
        }
    }

    /// Image flavour the entrypoint is shipped in.
    pub fn image_variant(&self) -> ImageVariant {
        match self {
            Entrypoint::Runtest => ImageVariant::Production,
            Entrypoint::Bash | Entrypoint::Ipython | Entrypoint::Jupyter => ImageVariant::Development,
        }
    }

    /// Whether a pseudo-terminal is attached for this entrypoint.
    pub fn is_interactive(&self) -> bool {
        !matches!(self, Entrypoint::Runtest)
    }
}

impl fmt::Display for Entrypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Entrypoint {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self> {
        Entrypoint::ALL
            .into_iter()
            .find(|ep| ep.name() == s)
            .ok_or_else(|| RunnerError::InvalidMode(format!("unknown entrypoint '{s}'")))
    }
}

/// Published image flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageVariant {
    /// Minimal image carrying only the test runner
    Production,
    /// Full image with shells and notebook tooling
    Development,
}

impl ImageVariant {
    /// Image name without registry, repository or tag.
    pub fn image_name(&self) -> &'static str {
        match self {
            ImageVariant::Production => "wft4galaxy-minimal",
            ImageVariant::Development => "wft4galaxy-develop",
        }
    }
}

/// Base operating system of the published images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseOs {
    #[default]
    Alpine,
    Ubuntu,
}

impl BaseOs {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseOs::Alpine => "alpine",
            BaseOs::Ubuntu => "ubuntu",
        }
    }
}

impl fmt::Display for BaseOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaseOs {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "alpine" => Ok(BaseOs::Alpine),
            "ubuntu" => Ok(BaseOs::Ubuntu),
            other => Err(RunnerError::Configuration(format!(
                "unsupported OS '{other}' (expected 'alpine' or 'ubuntu')"
            ))),
        }
    }
}

/// Server URL and API key handed to the tool inside the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub url: String,
    pub api_key: String,
}

impl ServerSettings {
    /// Resolve settings from explicit overrides, falling back to the
    /// process environment.
    pub fn resolve(server: Option<String>, api_key: Option<String>) -> Result<Self> {
        Self::resolve_with(server, api_key, |key| std::env::var(key).ok())
    }

    /// Resolve settings using `lookup` for environment fallbacks.
    pub fn resolve_with<F>(server: Option<String>, api_key: Option<String>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = server.or_else(|| lookup(SERVER_URL_ENV)).ok_or_else(|| {
            RunnerError::Configuration(format!(
                "server URL not defined! Use --server or the environment variable {SERVER_URL_ENV}"
            ))
        })?;
        let api_key = api_key.or_else(|| lookup(API_KEY_ENV)).ok_or_else(|| {
            RunnerError::Configuration(format!(
                "server API key not defined! Use --api-key or the environment variable {API_KEY_ENV}"
            ))
        })?;
        Ok(Self { url, api_key })
    }
}

/// Options only the batch test runner consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    /// Workflow-test suite file on the host
    pub config_file: PathBuf,
    /// Output folder on the host
    pub output: PathBuf,
    pub enable_logger: bool,
    pub disable_cleanup: bool,
    pub disable_assertions: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from(DEFAULT_CONFIG_FILENAME),
            output: PathBuf::from(DEFAULT_OUTPUT_FOLDER),
            enable_logger: false,
            disable_cleanup: false,
            disable_assertions: false,
        }
    }
}

/// Immutable request assembled from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationOptions {
    pub entrypoint: Entrypoint,
    /// Registry override
    pub registry: Option<String>,
    /// Repository override
    pub repository: Option<String>,
    /// Full `NAME:TAG` override; disables tag synthesis
    pub image: Option<String>,
    pub os: BaseOs,
    /// Skip the image refresh and use whatever is present locally
    pub use_local_image: bool,
    pub server_url: String,
    pub api_key: String,
    /// Raw `host:container` strings
    pub volumes: Vec<String>,
    /// Raw `host[:container]` strings
    pub ports: Vec<String>,
    /// Trailing test-name filters
    pub extra_args: Vec<String>,
    pub debug: bool,
    pub batch: BatchSettings,
}

impl InvocationOptions {
    /// Options with defaults for everything but the entrypoint and server.
    pub fn new(entrypoint: Entrypoint, server: ServerSettings) -> Self {
        Self {
            entrypoint,
            registry: None,
            repository: None,
            image: None,
            os: BaseOs::default(),
            use_local_image: false,
            server_url: server.url,
            api_key: server.api_key,
            volumes: Vec::new(),
            ports: Vec::new(),
            extra_args: Vec::new(),
            debug: false,
            batch: BatchSettings::default(),
        }
    }

    /// Whether a pseudo-terminal will be attached.
    pub fn is_interactive(&self) -> bool {
        self.entrypoint.is_interactive()
    }
}
