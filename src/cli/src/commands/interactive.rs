//! Options of the interactive entrypoints.

use clap::Args;
use wft_runner_core::InvocationOptions;

/// Port the notebook server listens on inside the container.
const NOTEBOOK_PORT: u16 = 8888;

#[derive(Args, Debug, Clone)]
pub struct JupyterArgs {
    /// Host port publishing the notebook server
    #[arg(long, default_value_t = 9876)]
    pub web_port: u16,
}

impl JupyterArgs {
    pub(crate) fn apply(self, options: &mut InvocationOptions) {
        options.ports.push(format!("{}:{}", self.web_port, NOTEBOOK_PORT));
    }
}
