//! wft-runner core - invocation resolution for containerized workflow tests.
//!
//! This crate is free of engine I/O: it parses bindings, resolves image
//! references, assembles invocations and decides exit codes.

pub mod config;
pub mod error;
pub mod exit;
pub mod image;
pub mod invocation;
pub mod properties;
pub mod spec;

// Re-export commonly used types
pub use config::{BaseOs, BatchSettings, Entrypoint, ImageVariant, InvocationOptions, ServerSettings};
pub use error::{Result, RunnerError, SpecKind};
pub use exit::{RunResult, FAILURE_EXIT, SUCCESS_EXIT};
pub use image::ResolvedImage;
pub use invocation::{BatchCommand, CommandBuilder, CreateRequest, Invocation};
pub use properties::{ImageDefaults, Properties, RepositoryMetadata};
pub use spec::{MountSpec, PortSpec};

/// wft-runner version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
