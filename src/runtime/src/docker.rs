//! Docker engine backed by the management API (`bollard`).

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::{
    AttachContainerOptions, AttachContainerResults, Config, CreateContainerOptions,
    RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
};
use bollard::models::{HostConfig, PortBinding};
use bollard::Docker;
use futures::StreamExt;
use wft_runner_core::error::{Result, RunnerError};
use wft_runner_core::{CreateRequest, PortSpec, FAILURE_EXIT};

use crate::engine::ContainerEngine;

/// Guidance shown when the daemon cannot be reached.
pub const DAEMON_HINT: &str =
    "Install Docker and make sure the daemon is running and accessible to the current user";

/// Container engine talking to the local Docker daemon.
#[derive(Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connect with the local defaults (`DOCKER_HOST` or the default socket)
    /// and check the daemon answers.
    pub async fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults().map_err(unavailable)?;
        docker.ping().await.map_err(unavailable)?;
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn create(&self, request: &CreateRequest) -> Result<String> {
        let response = self
            .docker
            .create_container(None::<CreateContainerOptions<String>>, container_config(request))
            .await
            .map_err(engine)?;
        for warning in &response.warnings {
            tracing::warn!(container = %response.id, "{}", warning);
        }
        Ok(response.id)
    }

    async fn attach(&self, id: &str) -> Result<i32> {
        // Attach before starting so no early output is lost.
        let AttachContainerResults { output, input } = self
            .docker
            .attach_container(
                id,
                Some(AttachContainerOptions::<String> {
                    stdin: Some(true),
                    stdout: Some(true),
                    stderr: Some(true),
                    stream: Some(true),
                    logs: Some(true),
                    detach_keys: None,
                }),
            )
            .await
            .map_err(engine)?;

        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(engine)?;

        crate::pty::run_session(self.docker.clone(), id.to_string(), output, input).await?;

        self.exit_code(id).await
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
            .map_err(engine)
    }
}

impl DockerEngine {
    async fn exit_code(&self, id: &str) -> Result<i32> {
        let mut wait = Box::pin(
            self.docker
                .wait_container(id, None::<WaitContainerOptions<String>>),
        );
        match wait.next().await {
            Some(Ok(response)) => Ok(response.status_code as i32),
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(code as i32),
            Some(Err(e)) => Err(engine(e)),
            None => Ok(FAILURE_EXIT),
        }
    }
}

/// Translate a create request into the engine's container config.
pub(crate) fn container_config(request: &CreateRequest) -> Config<String> {
    let (exposed_ports, port_bindings) = port_bindings(&request.ports);
    Config {
        image: Some(request.image.clone()),
        cmd: Some(request.command.clone()),
        env: Some(request.env.clone()),
        tty: Some(request.tty),
        open_stdin: Some(request.stdin_open),
        attach_stdin: Some(request.stdin_open),
        attach_stdout: Some(true),
        attach_stderr: Some(true),
        exposed_ports: Some(exposed_ports),
        host_config: Some(HostConfig {
            binds: Some(request.mounts.iter().map(|m| m.to_string()).collect()),
            port_bindings: Some(port_bindings),
            ..Default::default()
        }),
        ..Default::default()
    }
}

type ExposedPorts = HashMap<String, HashMap<(), ()>>;
type PortMap = HashMap<String, Option<Vec<PortBinding>>>;

/// Exposed ports and host bindings for `ports`.
///
/// A single-token spec exposes that port with an engine-assigned host port.
pub(crate) fn port_bindings(ports: &[PortSpec]) -> (ExposedPorts, PortMap) {
    let mut exposed = HashMap::new();
    let mut bindings: PortMap = HashMap::new();
    for port in ports {
        let (container, host) = match &port.container_port {
            Some(container) => (container.as_str(), Some(port.host_port.clone())),
            None => (port.host_port.as_str(), None),
        };
        let key = if container.contains('/') {
            container.to_string()
        } else {
            format!("{container}/tcp")
        };
        exposed.insert(key.clone(), HashMap::new());
        bindings
            .entry(key)
            .or_insert_with(|| Some(Vec::new()))
            .get_or_insert_with(Vec::new)
            .push(PortBinding {
                host_ip: None,
                host_port: host,
            });
    }
    (exposed, bindings)
}

fn engine(err: bollard::errors::Error) -> RunnerError {
    RunnerError::Engine(err.to_string())
}

fn unavailable(err: bollard::errors::Error) -> RunnerError {
    RunnerError::EnvironmentUnavailable {
        message: format!("cannot reach the Docker daemon: {err}"),
        hint: DAEMON_HINT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wft_runner_core::MountSpec;

    fn request(ports: Vec<PortSpec>) -> CreateRequest {
        CreateRequest {
            image: "crs4/wft4galaxy-develop:alpine-develop".to_string(),
            command: vec!["bash".to_string()],
            env: vec!["SERVER_URL=http://x".to_string(), "API_KEY=k".to_string()],
            mounts: vec![MountSpec::new("/a", "/b")],
            ports,
            tty: true,
            stdin_open: true,
        }
    }

    fn port(host: &str, container: Option<&str>) -> PortSpec {
        PortSpec {
            host_port: host.to_string(),
            container_port: container.map(String::from),
        }
    }

    #[test]
    fn test_port_pair_binds_host_to_container() {
        let (exposed, bindings) = port_bindings(&[port("8080", Some("80"))]);
        assert!(exposed.contains_key("80/tcp"));
        let binding = bindings["80/tcp"].as_ref().unwrap();
        assert_eq!(binding[0].host_port.as_deref(), Some("8080"));
    }

    #[test]
    fn test_single_port_gets_engine_assigned_host_port() {
        let (exposed, bindings) = port_bindings(&[port("9000", None)]);
        assert!(exposed.contains_key("9000/tcp"));
        let binding = bindings["9000/tcp"].as_ref().unwrap();
        assert_eq!(binding.len(), 1);
        assert!(binding[0].host_port.is_none());
    }

    #[test]
    fn test_explicit_protocol_is_kept() {
        let (exposed, _) = port_bindings(&[port("5353", Some("53/udp"))]);
        assert!(exposed.contains_key("53/udp"));
    }

    #[test]
    fn test_same_container_port_collects_bindings() {
        let (_, bindings) = port_bindings(&[port("8080", Some("80")), port("8081", Some("80"))]);
        assert_eq!(bindings["80/tcp"].as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_container_config() {
        let config = container_config(&request(vec![port("8888", Some("9876"))]));
        assert_eq!(config.image.as_deref(), Some("crs4/wft4galaxy-develop:alpine-develop"));
        assert_eq!(config.tty, Some(true));
        assert_eq!(config.open_stdin, Some(true));
        assert_eq!(config.env.as_ref().unwrap().len(), 2);
        let host = config.host_config.unwrap();
        assert_eq!(host.binds, Some(vec!["/a:/b".to_string()]));
        assert!(host.port_bindings.unwrap().contains_key("9876/tcp"));
    }
}
