//! ContainerEngine - Trait for container management backends.

use async_trait::async_trait;
use wft_runner_core::error::Result;
use wft_runner_core::CreateRequest;

/// Management interface used by interactive sessions.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Create a container from `request`, returning its ID.
    async fn create(&self, request: &CreateRequest) -> Result<String>;

    /// Start the container and bridge the local terminal to it until it
    /// exits. Returns the container's exit code.
    async fn attach(&self, id: &str) -> Result<i32>;

    /// Force-remove the container.
    async fn remove(&self, id: &str) -> Result<()>;
}
