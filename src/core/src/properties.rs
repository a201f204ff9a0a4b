//! Process-wide image defaults loaded once at startup.
//!
//! The properties document is JSON:
//!
//! ```json
//! { "Docker": { "registry": "quay.io", "repository": "crs4" },
//!   "Repository": { "tag": "v0.3", "branch": "develop" } }
//! ```
//!
//! Every key is optional. The loaded values are handed explicitly to the
//! image resolver; nothing here is global.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RunnerError};

/// Repository used when neither the user nor the properties name one.
pub const DEFAULT_REPOSITORY: &str = "crs4";

/// Registry/repository fallbacks for image resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDefaults {
    #[serde(default)]
    pub registry: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
}

impl Default for ImageDefaults {
    fn default() -> Self {
        Self {
            registry: None,
            repository: Some(DEFAULT_REPOSITORY.to_string()),
        }
    }
}

/// Release ref baked into synthesized image tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PropertiesFile {
    #[serde(rename = "Docker", default)]
    docker: Option<DockerSection>,
    #[serde(rename = "Repository", default)]
    repository: Option<RepositoryMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct DockerSection {
    #[serde(default)]
    registry: Option<String>,
    #[serde(default)]
    repository: Option<String>,
}

/// Loaded properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    pub image: ImageDefaults,
    pub repository: RepositoryMetadata,
}

impl Properties {
    /// Parse a properties document, filling gaps with built-in defaults.
    pub fn from_json(data: &str) -> Result<Self> {
        let file: PropertiesFile = serde_json::from_str(data)?;
        let mut image = ImageDefaults::default();
        if let Some(docker) = file.docker {
            if docker.registry.is_some() {
                image.registry = docker.registry;
            }
            if docker.repository.is_some() {
                image.repository = docker.repository;
            }
        }
        Ok(Self {
            image,
            repository: file.repository.unwrap_or_default(),
        })
    }

    /// Load from an explicit path. The file must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            RunnerError::Configuration(format!(
                "cannot read properties file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&data).map_err(|e| {
            RunnerError::Configuration(format!(
                "invalid properties file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load from `path` if given, otherwise from the default location.
    ///
    /// A missing default file yields built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = Self::default_path();
        if default_path.exists() {
            Self::load(&default_path)
        } else {
            tracing::debug!(
                path = %default_path.display(),
                "No properties file found, using default settings"
            );
            Ok(Self::default())
        }
    }

    /// `~/.wft-runner/properties.json`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".wft-runner"))
            .unwrap_or_else(|| PathBuf::from(".wft-runner"))
            .join("properties.json")
    }
}
