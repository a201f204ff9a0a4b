//! `wft-runner runtest` - batch execution of a workflow-test suite.

use std::path::PathBuf;

use clap::Args;
use wft_runner_core::config::{DEFAULT_CONFIG_FILENAME, DEFAULT_OUTPUT_FOLDER};
use wft_runner_core::{BatchSettings, InvocationOptions};

#[derive(Args, Debug, Clone)]
pub struct RuntestArgs {
    /// Workflow-test suite file
    #[arg(short = 'f', long = "file", default_value = DEFAULT_CONFIG_FILENAME)]
    pub file: PathBuf,

    /// Output folder for test results
    #[arg(short = 'o', long = "output", default_value = DEFAULT_OUTPUT_FOLDER)]
    pub output: PathBuf,

    /// Enable the test runner's logger
    #[arg(long)]
    pub enable_logger: bool,

    /// Keep the workflows and histories created by the tests
    #[arg(long)]
    pub disable_cleanup: bool,

    /// Run the workflows without checking their outputs
    #[arg(long)]
    pub disable_assertions: bool,

    /// Names of the tests to run (all when omitted)
    pub tests: Vec<String>,
}

impl RuntestArgs {
    pub(crate) fn apply(self, options: &mut InvocationOptions) {
        options.batch = BatchSettings {
            config_file: self.file,
            output: self.output,
            enable_logger: self.enable_logger,
            disable_cleanup: self.disable_cleanup,
            disable_assertions: self.disable_assertions,
        };
        options.extra_args = self.tests;
    }
}
