//! wft-runner runtime - container engine boundary.
//!
//! This crate owns every side effect of a run: image refresh, the batch
//! child process, and interactive container sessions with their
//! pseudo-terminal bridge.

pub mod dispatch;
pub mod engine;
pub mod process;
pub mod pull;
pub mod signal;

#[cfg(feature = "interactive")]
pub mod docker;
#[cfg(feature = "interactive")]
mod pty;

// Re-export common types
pub use dispatch::{Dispatcher, Interactive, NonInteractive};
pub use engine::ContainerEngine;
pub use pull::{refresh_image, DockerCliRefresher, ImageRefresher};

#[cfg(feature = "interactive")]
pub use docker::DockerEngine;

/// wft-runner runtime version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
