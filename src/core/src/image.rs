//! Image reference resolution.
//!
//! Precedence, per path segment:
//! - registry: `--registry`, then the properties default, else omitted
//! - repository: `--repository`, then the properties default, else error
//! - name:tag: `--image` verbatim, else `<variant image>:<os>-<ref>` where
//!   `ref` is the release tag, then the branch, then `develop`

use crate::config::InvocationOptions;
use crate::error::{Result, RunnerError};
use crate::properties::{ImageDefaults, RepositoryMetadata};

/// Ref used when the repository metadata names neither a tag nor a branch.
pub const DEFAULT_REF: &str = "develop";

/// Fully-qualified image plus the refresh decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// `[registry/]repository/name:tag`
    pub full_reference: String,
    /// Refresh from the registry before use
    pub should_pull: bool,
}

/// Compute the image to launch for `options`.
///
/// Pure: the same inputs always give the same reference.
pub fn resolve(
    options: &InvocationOptions,
    defaults: &ImageDefaults,
    metadata: &RepositoryMetadata,
) -> Result<ResolvedImage> {
    let mut parts: Vec<&str> = Vec::with_capacity(3);

    if let Some(registry) = non_empty(&options.registry).or_else(|| non_empty(&defaults.registry)) {
        parts.push(registry);
    }

    let repository = non_empty(&options.repository)
        .or_else(|| non_empty(&defaults.repository))
        .ok_or_else(|| {
            RunnerError::Configuration(
                "no image repository configured! Use --repository or set Docker.repository in the properties file"
                    .to_string(),
            )
        })?;
    parts.push(repository);

    let synthesized;
    let name = match non_empty(&options.image) {
        Some(image) => image,
        None => {
            synthesized = synthesize_image_name(options, metadata);
            synthesized.as_str()
        }
    };
    parts.push(name);

    let full_reference = parts.join("/");
    tracing::debug!(image = %full_reference, "Resolved image reference");

    Ok(ResolvedImage {
        full_reference,
        should_pull: !options.use_local_image,
    })
}

/// `<variant image>:<os>-<ref>`
fn synthesize_image_name(options: &InvocationOptions, metadata: &RepositoryMetadata) -> String {
    let repo_ref = non_empty(&metadata.tag)
        .or_else(|| non_empty(&metadata.branch))
        .unwrap_or(DEFAULT_REF);
    format!(
        "{}:{}-{}",
        options.entrypoint.image_variant().image_name(),
        options.os,
        repo_ref
    )
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BaseOs, Entrypoint, ServerSettings};

    fn options(entrypoint: Entrypoint) -> InvocationOptions {
        InvocationOptions::new(
            entrypoint,
            ServerSettings {
                url: "http://x".to_string(),
                api_key: "k".to_string(),
            },
        )
    }

    fn metadata(tag: Option<&str>, branch: Option<&str>) -> RepositoryMetadata {
        RepositoryMetadata {
            tag: tag.map(String::from),
            branch: branch.map(String::from),
        }
    }

    #[test]
    fn test_default_batch_image() {
        let resolved = resolve(
            &options(Entrypoint::Runtest),
            &ImageDefaults::default(),
            &RepositoryMetadata::default(),
        )
        .unwrap();
        assert_eq!(resolved.full_reference, "crs4/wft4galaxy-minimal:alpine-develop");
        assert!(resolved.should_pull);
    }

    #[test]
    fn test_interactive_entrypoints_use_development_image() {
        for ep in [Entrypoint::Bash, Entrypoint::Ipython, Entrypoint::Jupyter] {
            let resolved = resolve(&options(ep), &ImageDefaults::default(), &RepositoryMetadata::default())
                .unwrap();
            assert_eq!(resolved.full_reference, "crs4/wft4galaxy-develop:alpine-develop");
        }
    }

    #[test]
    fn test_tag_wins_over_branch() {
        let resolved = resolve(
            &options(Entrypoint::Runtest),
            &ImageDefaults::default(),
            &metadata(Some("v1.2"), Some("develop")),
        )
        .unwrap();
        assert_eq!(resolved.full_reference, "crs4/wft4galaxy-minimal:alpine-v1.2");
    }

    #[test]
    fn test_branch_used_without_tag() {
        let resolved = resolve(
            &options(Entrypoint::Runtest),
            &ImageDefaults::default(),
            &metadata(None, Some("feature-x")),
        )
        .unwrap();
        assert!(resolved.full_reference.ends_with(":alpine-feature-x"));
    }

    #[test]
    fn test_os_override() {
        let mut opts = options(Entrypoint::Bash);
        opts.os = BaseOs::Ubuntu;
        let resolved = resolve(&opts, &ImageDefaults::default(), &RepositoryMetadata::default()).unwrap();
        assert_eq!(resolved.full_reference, "crs4/wft4galaxy-develop:ubuntu-develop");
    }

    #[test]
    fn test_image_override_used_verbatim() {
        let mut opts = options(Entrypoint::Runtest);
        opts.image = Some("custom:latest".to_string());
        opts.os = BaseOs::Ubuntu;
        let resolved = resolve(&opts, &ImageDefaults::default(), &metadata(Some("v9"), None)).unwrap();
        assert_eq!(resolved.full_reference, "crs4/custom:latest");
        assert_eq!(resolved.full_reference.rsplit('/').next(), Some("custom:latest"));
    }

    #[test]
    fn test_registry_and_repository_overrides() {
        let mut opts = options(Entrypoint::Runtest);
        opts.registry = Some("registry.example.org:5000".to_string());
        opts.repository = Some("team".to_string());
        let defaults = ImageDefaults {
            registry: Some("quay.io".to_string()),
            repository: Some("crs4".to_string()),
        };
        let resolved = resolve(&opts, &defaults, &RepositoryMetadata::default()).unwrap();
        assert_eq!(
            resolved.full_reference,
            "registry.example.org:5000/team/wft4galaxy-minimal:alpine-develop"
        );
    }

    #[test]
    fn test_default_registry_from_properties() {
        let defaults = ImageDefaults {
            registry: Some("quay.io".to_string()),
            repository: Some("crs4".to_string()),
        };
        let resolved = resolve(&options(Entrypoint::Runtest), &defaults, &RepositoryMetadata::default())
            .unwrap();
        assert!(resolved.full_reference.starts_with("quay.io/crs4/"));
    }

    #[test]
    fn test_missing_repository_is_configuration_error() {
        let defaults = ImageDefaults {
            registry: None,
            repository: None,
        };
        let err = resolve(&options(Entrypoint::Runtest), &defaults, &RepositoryMetadata::default())
            .unwrap_err();
        assert!(matches!(err, RunnerError::Configuration(_)));
    }

    #[test]
    fn test_local_image_disables_pull() {
        let mut opts = options(Entrypoint::Runtest);
        opts.use_local_image = true;
        let resolved = resolve(&opts, &ImageDefaults::default(), &RepositoryMetadata::default()).unwrap();
        assert!(!resolved.should_pull);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let opts = options(Entrypoint::Jupyter);
        let meta = metadata(Some("v0.3"), None);
        let first = resolve(&opts, &ImageDefaults::default(), &meta).unwrap();
        let second = resolve(&opts, &ImageDefaults::default(), &meta).unwrap();
        assert_eq!(first, second);
    }
}
