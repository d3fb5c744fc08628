//! Per-request resolution context.
//!
//! A [`ResolutionContext`] pins down everything one packaging request needs
//! to know about where templates come from: the selected template and
//! version, the raw platform identifier and the two bundle roots. It is
//! built once per request and never shared.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tgc_catalog::Version;
use tracing::debug;

use crate::error::{PackagerError, PackagerResult};

/// Entry template producing the deployment configuration.
pub const DEPLOYMENT_CONFIG_ENTRY: &str = "trustgraph-config.jsonnet";

/// Optional entry template listing extra support files.
pub const ADDITIONALS_ENTRY: &str = "additionals.jsonnet";

/// Archive path of the deployment configuration.
pub const DEPLOYMENT_CONFIG_PATH: &str = "trustgraph/config.json";

/// Lowest bundle version that produces a deployment configuration.
/// Older bundles embed the equivalent data in the platform resources.
pub const DEPLOYMENT_CONFIG_MIN_VERSION: &str = "1.0";

/// Deployment platform family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    Compose,
    Kubernetes,
}

impl PlatformFamily {
    /// Archive name of the serialized resource document.
    pub fn resource_document(&self) -> &'static str {
        match self {
            PlatformFamily::Compose => "docker-compose.yaml",
            PlatformFamily::Kubernetes => "resources.yaml",
        }
    }
}

/// Supported deployment platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    DockerCompose,
    PodmanCompose,
    MinikubeK8s,
    GcpK8s,
    AksK8s,
    EksK8s,
    ScwK8s,
    OvhK8s,
}

impl Platform {
    pub const ALL: [Platform; 8] = [
        Platform::DockerCompose,
        Platform::PodmanCompose,
        Platform::MinikubeK8s,
        Platform::GcpK8s,
        Platform::AksK8s,
        Platform::EksK8s,
        Platform::ScwK8s,
        Platform::OvhK8s,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::DockerCompose => "docker-compose",
            Platform::PodmanCompose => "podman-compose",
            Platform::MinikubeK8s => "minikube-k8s",
            Platform::GcpK8s => "gcp-k8s",
            Platform::AksK8s => "aks-k8s",
            Platform::EksK8s => "eks-k8s",
            Platform::ScwK8s => "scw-k8s",
            Platform::OvhK8s => "ovh-k8s",
        }
    }

    pub fn family(&self) -> PlatformFamily {
        match self {
            Platform::DockerCompose | Platform::PodmanCompose => PlatformFamily::Compose,
            _ => PlatformFamily::Kubernetes,
        }
    }

    /// Entry template producing this platform's resources.
    pub fn resources_entry(&self) -> String {
        format!("config-to-{}.jsonnet", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = PackagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| PackagerError::BadPlatform(s.to_string()))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where template and resource bundles live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    pub templates_dir: PathBuf,
    pub resources_dir: PathBuf,
}

impl AssetLayout {
    pub fn new(templates_dir: impl Into<PathBuf>, resources_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            resources_dir: resources_dir.into(),
        }
    }

    /// Default catalog location inside the templates directory.
    pub fn catalog_path(&self) -> PathBuf {
        self.templates_dir.join("index.json")
    }

    /// Static wizard resources shared by every template.
    pub fn dialog_dir(&self) -> PathBuf {
        self.resources_dir.join("dialog")
    }
}

/// How a bundle contributes support files to the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportFiles {
    /// Evaluate the bundle's additionals template
    Additionals,
    /// Older bundles: copy the resource bundle tree verbatim
    CopyResourceTree,
}

/// Version-dependent behaviour of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSupport {
    pub deployment_config: bool,
    pub support_files: SupportFiles,
}

/// Immutable per-request view of one template bundle.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    template: String,
    version: Version,
    platform: String,
    template_root: PathBuf,
    resource_root: PathBuf,
    features: FeatureSupport,
}

impl ResolutionContext {
    /// Bind a template/version to its bundle roots.
    ///
    /// The platform is recorded as given and only checked when resources
    /// are generated.
    pub fn new(
        layout: &AssetLayout,
        template: impl Into<String>,
        version: Version,
        platform: impl Into<String>,
    ) -> PackagerResult<Self> {
        let template = template.into();
        let template_root = layout.templates_dir.join(&template);
        let resource_root = layout.resources_dir.join(&template);

        let floor = Version::parse(DEPLOYMENT_CONFIG_MIN_VERSION)?;
        let support_files = if template_root.join(ADDITIONALS_ENTRY).is_file() {
            SupportFiles::Additionals
        } else {
            SupportFiles::CopyResourceTree
        };
        let features = FeatureSupport {
            deployment_config: version >= floor,
            support_files,
        };

        debug!(
            "Resolution context: template={} version={} features={:?}",
            template, version, features
        );

        Ok(Self {
            template,
            version,
            platform: platform.into(),
            template_root,
            resource_root,
            features,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Platform identifier exactly as requested.
    pub fn platform_name(&self) -> &str {
        &self.platform
    }

    /// Validate the requested platform.
    pub fn platform(&self) -> PackagerResult<Platform> {
        self.platform.parse()
    }

    pub fn template_root(&self) -> &Path {
        &self.template_root
    }

    pub fn resource_root(&self) -> &Path {
        &self.resource_root
    }

    pub fn features(&self) -> FeatureSupport {
        self.features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_platform_parsing() {
        assert_eq!("docker-compose".parse::<Platform>().unwrap(), Platform::DockerCompose);
        assert_eq!("ovh-k8s".parse::<Platform>().unwrap().family(), PlatformFamily::Kubernetes);
        assert!(matches!(
            "invalid-platform".parse::<Platform>(),
            Err(PackagerError::BadPlatform(_))
        ));
    }

    #[test]
    fn test_resource_documents() {
        assert_eq!(Platform::PodmanCompose.family().resource_document(), "docker-compose.yaml");
        assert_eq!(Platform::GcpK8s.family().resource_document(), "resources.yaml");
        assert_eq!(Platform::EksK8s.resources_entry(), "config-to-eks-k8s.jsonnet");
    }

    #[test]
    fn test_context_accepts_unknown_platform_until_generation() {
        let dir = tempdir().unwrap();
        let layout = AssetLayout::new(dir.path().join("templates"), dir.path().join("resources"));
        let ctx = ResolutionContext::new(
            &layout,
            "1.8",
            Version::parse("1.8.12").unwrap(),
            "invalid-platform",
        )
        .unwrap();

        assert_eq!(ctx.platform_name(), "invalid-platform");
        assert!(ctx.platform().is_err());
        assert_eq!(ctx.template_root(), dir.path().join("templates").join("1.8"));
        assert_eq!(ctx.resource_root(), dir.path().join("resources").join("1.8"));
    }

    #[test]
    fn test_feature_flags() {
        let dir = tempdir().unwrap();
        let layout = AssetLayout::new(dir.path().join("templates"), dir.path().join("resources"));

        let old = ResolutionContext::new(&layout, "0.22", Version::parse("0.22.9").unwrap(), "gcp-k8s")
            .unwrap();
        assert!(!old.features().deployment_config);
        assert_eq!(old.features().support_files, SupportFiles::CopyResourceTree);

        fs::create_dir_all(dir.path().join("templates/1.8")).unwrap();
        fs::write(dir.path().join("templates/1.8").join(ADDITIONALS_ENTRY), "{}").unwrap();
        let new = ResolutionContext::new(&layout, "1.8", Version::parse("1.0").unwrap(), "gcp-k8s")
            .unwrap();
        assert!(new.features().deployment_config);
        assert_eq!(new.features().support_files, SupportFiles::Additionals);
    }
}
