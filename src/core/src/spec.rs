//! Volume and port binding parsing.
//!
//! Turns the raw `-v host:container` and `-p host[:container]` strings
//! into structured bindings. Order and duplicates are preserved; which
//! binding wins on conflict is left to the container engine.

use std::fmt;

use crate::error::{Result, RunnerError, SpecKind};

/// A host directory bound into the container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountSpec {
    pub host_path: String,
    pub container_path: String,
}

impl MountSpec {
    pub fn new(host_path: impl Into<String>, container_path: impl Into<String>) -> Self {
        Self {
            host_path: host_path.into(),
            container_path: container_path.into(),
        }
    }
}

impl fmt::Display for MountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host_path, self.container_path)
    }
}

/// A published port.
///
/// `container_port == None` comes from a single-token spec; the engine
/// then picks the other side of the mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortSpec {
    pub host_port: String,
    pub container_port: Option<String>,
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.container_port {
            Some(container) => write!(f, "{}:{}", self.host_port, container),
            None => f.write_str(&self.host_port),
        }
    }
}

/// Parse a single `host:container` volume string.
pub fn parse_volume(raw: &str) -> Result<MountSpec> {
    let parts: Vec<&str> = raw.split(':').collect();
    match parts.as_slice() {
        [host, container] if !host.is_empty() && !container.is_empty() => {
            Ok(MountSpec::new(*host, *container))
        }
        _ => Err(invalid(SpecKind::Volume, raw)),
    }
}

/// Parse every volume string, failing on the first malformed one.
pub fn parse_volumes<S: AsRef<str>>(raw: &[S]) -> Result<Vec<MountSpec>> {
    raw.iter().map(|v| parse_volume(v.as_ref())).collect()
}

/// Parse a single `host` or `host:container` port string.
pub fn parse_port(raw: &str) -> Result<PortSpec> {
    let parts: Vec<&str> = raw.split(':').collect();
    match parts.as_slice() {
        [host] if !host.is_empty() => Ok(PortSpec {
            host_port: host.to_string(),
            container_port: None,
        }),
        [host, container] if !host.is_empty() && !container.is_empty() => Ok(PortSpec {
            host_port: host.to_string(),
            container_port: Some(container.to_string()),
        }),
        _ => Err(invalid(SpecKind::Port, raw)),
    }
}

/// Parse every port string, failing on the first malformed one.
pub fn parse_ports<S: AsRef<str>>(raw: &[S]) -> Result<Vec<PortSpec>> {
    raw.iter().map(|p| parse_port(p.as_ref())).collect()
}

fn invalid(kind: SpecKind, raw: &str) -> RunnerError {
    RunnerError::InvalidSpec {
        kind,
        spec: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_volume() {
        let mount = parse_volume("/host/data:/data").unwrap();
        assert_eq!(mount.host_path, "/host/data");
        assert_eq!(mount.container_path, "/data");
    }

    #[test]
    fn test_parse_volume_rejects_single_segment() {
        let err = parse_volume("/host/data").unwrap_err();
        match err {
            RunnerError::InvalidSpec { kind, spec } => {
                assert_eq!(kind, SpecKind::Volume);
                assert_eq!(spec, "/host/data");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_volume_rejects_mode_suffix() {
        assert!(parse_volume("/a:/b:ro").is_err());
    }

    #[test]
    fn test_parse_volume_rejects_empty_segments() {
        assert!(parse_volume(":/b").is_err());
        assert!(parse_volume("/a:").is_err());
        assert!(parse_volume("").is_err());
    }

    #[test]
    fn test_parse_volumes_preserves_order_and_duplicates() {
        let mounts = parse_volumes(&["/a:/x", "/b:/y", "/a:/x"]).unwrap();
        assert_eq!(
            mounts,
            vec![
                MountSpec::new("/a", "/x"),
                MountSpec::new("/b", "/y"),
                MountSpec::new("/a", "/x"),
            ]
        );
    }

    #[test]
    fn test_parse_volumes_names_offending_entry() {
        let err = parse_volumes(&["/a:/x", "broken"]).unwrap_err();
        assert!(err.to_string().contains("'broken'"));
    }

    #[test]
    fn test_parse_volumes_empty() {
        let raw: Vec<String> = Vec::new();
        assert!(parse_volumes(&raw).unwrap().is_empty());
    }

    #[test]
    fn test_parse_port_single_token() {
        let port = parse_port("8080").unwrap();
        assert_eq!(port.host_port, "8080");
        assert_eq!(port.container_port, None);
    }

    #[test]
    fn test_parse_port_pair() {
        let port = parse_port("8080:80").unwrap();
        assert_eq!(port.host_port, "8080");
        assert_eq!(port.container_port.as_deref(), Some("80"));
    }

    #[test]
    fn test_parse_port_rejects_three_segments() {
        let err = parse_port("127.0.0.1:8080:80").unwrap_err();
        assert!(matches!(
            err,
            RunnerError::InvalidSpec {
                kind: SpecKind::Port,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_ports_keeps_order() {
        let ports = parse_ports(&["9000", "8888:9876"]).unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].to_string(), "9000");
        assert_eq!(ports[1].to_string(), "8888:9876");
    }

    #[test]
    fn test_mount_display() {
        assert_eq!(MountSpec::new("/a", "/b").to_string(), "/a:/b");
    }
}
