use std::fmt;

use thiserror::Error;

/// Which kind of user-supplied binding failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    Volume,
    Port,
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecKind::Volume => f.write_str("volume"),
            SpecKind::Port => f.write_str("port"),
        }
    }
}

/// wft-runner error types
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Malformed `-v` / `-p` argument
    #[error("Invalid {kind} parameter '{spec}'. See 'docker run' syntax for more details")]
    InvalidSpec { kind: SpecKind, spec: String },

    /// Missing server settings or unresolvable image location
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Entrypoint does not match the requested dispatch mode
    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    /// The container management capability is missing on this host
    #[error("Environment unavailable: {message}")]
    EnvironmentUnavailable { message: String, hint: String },

    /// Container engine or daemon failure
    #[error("Engine error: {0}")]
    Engine(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RunnerError {
    /// User guidance attached to the error, if any.
    pub fn hint(&self) -> Option<&str> {
        match self {
            RunnerError::EnvironmentUnavailable { hint, .. } => Some(hint),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RunnerError {
    fn from(err: serde_json::Error) -> Self {
        RunnerError::Serialization(err.to_string())
    }
}

/// Result type alias for wft-runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_volume_spec_display() {
        let error = RunnerError::InvalidSpec {
            kind: SpecKind::Volume,
            spec: "/a:/b:/c".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid volume parameter '/a:/b:/c'. See 'docker run' syntax for more details"
        );
    }

    #[test]
    fn test_invalid_port_spec_display() {
        let error = RunnerError::InvalidSpec {
            kind: SpecKind::Port,
            spec: "1:2:3".to_string(),
        };
        assert!(error.to_string().contains("port parameter '1:2:3'"));
    }

    #[test]
    fn test_configuration_error_display() {
        let error = RunnerError::Configuration("server URL not defined".to_string());
        assert_eq!(error.to_string(), "Configuration error: server URL not defined");
    }

    #[test]
    fn test_environment_unavailable_hint() {
        let error = RunnerError::EnvironmentUnavailable {
            message: "Docker daemon not reachable".to_string(),
            hint: "Start Docker".to_string(),
        };
        assert_eq!(error.to_string(), "Environment unavailable: Docker daemon not reachable");
        assert_eq!(error.hint(), Some("Start Docker"));
    }

    #[test]
    fn test_other_errors_have_no_hint() {
        let error = RunnerError::InvalidMode("runtest".to_string());
        assert!(error.hint().is_none());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: RunnerError = io_error.into();
        assert!(matches!(error, RunnerError::Io(_)));
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{ invalid").unwrap_err();
        let error: RunnerError = json_error.into();
        assert!(matches!(error, RunnerError::Serialization(_)));
    }
}
