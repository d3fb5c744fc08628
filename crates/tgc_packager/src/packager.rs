//! Packaging orchestration.
//!
//! A [`Packager`] serves exactly one request. It resolves the selection
//! against the catalog, binds a [`ResolutionContext`], then runs the
//! evaluation passes the requested [`OutputMode`] needs:
//!
//! - platform resources (`config-to-{platform}.jsonnet`), serialized as YAML
//! - deployment configuration (`trustgraph-config.jsonnet`), serialized as
//!   pretty JSON, only for bundles at or above the compatibility floor
//! - support files, from `additionals.jsonnet` or a verbatim copy of the
//!   resource bundle
//!
//! Any failure aborts the request. No partial artifact is ever returned.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tgc_catalog::{CatalogError, TemplateDescriptor, Version, VersionIndex};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::archive::ArchiveBuilder;
use crate::context::{
    AssetLayout, ResolutionContext, SupportFiles, ADDITIONALS_ENTRY, DEPLOYMENT_CONFIG_MIN_VERSION,
    DEPLOYMENT_CONFIG_PATH,
};
use crate::engine::{Generator, TemplateEngine};
use crate::error::{PackagerError, PackagerResult};
use crate::paths::join_logical;
use crate::resolver::OverrideResolver;

/// Default target platform.
pub const DEFAULT_PLATFORM: &str = "docker-compose";

/// What the caller asked to package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub template: Option<String>,
    pub version: Option<String>,
    pub platform: String,
    pub latest: bool,
    pub latest_stable: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(DEFAULT_PLATFORM)
    }
}

impl Selection {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            template: None,
            version: None,
            platform: platform.into(),
            latest: false,
            latest_stable: false,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_latest(mut self, latest: bool) -> Self {
        self.latest = latest;
        self
    }

    pub fn with_latest_stable(mut self, latest_stable: bool) -> Self {
        self.latest_stable = latest_stable;
        self
    }

    /// Resolve the template name and version against the catalog.
    ///
    /// A latest flag selects the global latest (or latest stable) entry
    /// and overrides any explicit template and version. `latest_stable`
    /// takes precedence over `latest`.
    pub fn resolve(&self, index: &VersionIndex) -> PackagerResult<(String, Version)> {
        if self.latest_stable || self.latest {
            let descriptor = self.resolve_latest(index)?;
            if let Some(template) = self.template.as_deref() {
                if template != descriptor.name {
                    info!(
                        "Latest flag selects template {}, ignoring template {}",
                        descriptor.name, template
                    );
                }
            }
            return Ok((descriptor.name.clone(), descriptor.version.clone()));
        }

        let template = self
            .template
            .as_deref()
            .ok_or(PackagerError::NoTemplateSelected)?;

        if !index.contains_template(template) {
            return Err(PackagerError::UnknownTemplate(template.to_string()));
        }

        match self.version.as_deref() {
            Some(raw) => {
                let version = Version::parse(raw)?;
                if !index.versions_of(template).iter().any(|t| t.version == version) {
                    warn!(
                        "Version {} of template {} is not in the catalog, using it anyway",
                        version, template
                    );
                }
                Ok((template.to_string(), version))
            }
            None => {
                let descriptor = index
                    .latest_of(template)
                    .map_err(|_| PackagerError::UnknownTemplate(template.to_string()))?;
                Ok((template.to_string(), descriptor.version.clone()))
            }
        }
    }

    fn resolve_latest<'a>(&self, index: &'a VersionIndex) -> PackagerResult<&'a TemplateDescriptor> {
        let found = if self.latest_stable {
            index.latest_stable()
        } else {
            index.latest()
        };

        found.map_err(|e| match e {
            CatalogError::NotFound(_) => PackagerError::NoTemplateSelected,
            other => PackagerError::Catalog(other),
        })
    }
}

/// Which output a request produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Full compressed archive
    #[default]
    Archive,
    /// Deployment configuration document only
    DeploymentConfig,
    /// Platform resource document only
    Resources,
}

/// Result of one packaging request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Archive(Vec<u8>),
    Document(String),
}

impl Artifact {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Artifact::Archive(bytes) => bytes,
            Artifact::Document(text) => text.into_bytes(),
        }
    }
}

/// Parse and re-serialize a caller configuration.
///
/// Rejects anything that is not JSON before a template ever sees it.
pub fn normalize_config(config: &str) -> PackagerResult<String> {
    let value: Value = serde_json::from_str(config).map_err(PackagerError::InvalidConfig)?;
    Ok(serde_json::to_string(&value)?)
}

/// Pretty JSON with four-space indentation.
pub fn to_pretty_json(value: &Value) -> PackagerResult<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Generates deployment artifacts for one template bundle.
pub struct Packager {
    context: ResolutionContext,
    generator: Generator,
}

impl Packager {
    /// Resolve the selection and bind the bundle roots.
    pub fn new(
        selection: &Selection,
        index: &VersionIndex,
        layout: &AssetLayout,
        engine: Arc<dyn TemplateEngine>,
    ) -> PackagerResult<Self> {
        let (template, version) = selection.resolve(index)?;
        let context = ResolutionContext::new(layout, template, version, selection.platform.clone())?;
        Ok(Self {
            context,
            generator: Generator::new(engine),
        })
    }

    pub fn context(&self) -> &ResolutionContext {
        &self.context
    }

    /// Produce the output for `mode`.
    pub fn package(&self, config: &str, mode: OutputMode) -> PackagerResult<Artifact> {
        match mode {
            OutputMode::Archive => self.generate(config).map(Artifact::Archive),
            OutputMode::DeploymentConfig => {
                self.deployment_config_document(config).map(Artifact::Document)
            }
            OutputMode::Resources => self.resources_document(config).map(Artifact::Document),
        }
    }

    /// Build the full archive.
    pub fn generate(&self, config: &str) -> PackagerResult<Vec<u8>> {
        let config = normalize_config(config)?;

        info!(
            "Generating for platform={} template={} version={} engine={}",
            self.context.platform_name(),
            self.context.template(),
            self.context.version(),
            self.generator.engine_name()
        );

        let platform = self.context.platform()?;
        let resolver = OverrideResolver::new(&self.context, &config, &self.generator);

        let resources = self.render_resources(&resolver)?;
        let deployment_config = if self.context.features().deployment_config {
            Some(to_pretty_json(&resolver.evaluate_deployment_config()?)?)
        } else {
            info!(
                "Version {} predates deployment configuration, omitting {}",
                self.context.version(),
                DEPLOYMENT_CONFIG_PATH
            );
            None
        };
        let support = self.support_files(&resolver)?;

        let mut archive = ArchiveBuilder::new();
        archive.add(platform.family().resource_document(), resources.as_bytes())?;
        if let Some(document) = &deployment_config {
            archive.add(DEPLOYMENT_CONFIG_PATH, document.as_bytes())?;
        }
        for (name, content) in &support {
            archive.add(name, content)?;
        }

        let bytes = archive.finish()?;
        info!("Generation complete.");
        Ok(bytes)
    }

    /// Deployment configuration as pretty JSON, the same text the archive
    /// stores under `trustgraph/config.json`.
    pub fn deployment_config_document(&self, config: &str) -> PackagerResult<String> {
        let config = normalize_config(config)?;

        if !self.context.features().deployment_config {
            return Err(PackagerError::Unsupported(format!(
                "Template {} version {} has no deployment configuration (needs {} or later)",
                self.context.template(),
                self.context.version(),
                DEPLOYMENT_CONFIG_MIN_VERSION
            )));
        }

        let resolver = OverrideResolver::new(&self.context, &config, &self.generator);
        to_pretty_json(&resolver.evaluate_deployment_config()?)
    }

    /// Platform resources as a YAML document.
    pub fn resources_document(&self, config: &str) -> PackagerResult<String> {
        let config = normalize_config(config)?;
        self.context.platform()?;

        let resolver = OverrideResolver::new(&self.context, &config, &self.generator);
        self.render_resources(&resolver)
    }

    fn render_resources(&self, resolver: &OverrideResolver<'_>) -> PackagerResult<String> {
        let platform = self.context.platform()?;
        let value = resolver.evaluate_entry(&platform.resources_entry())?;
        Ok(serde_yaml::to_string(&value)?)
    }

    fn support_files(&self, resolver: &OverrideResolver<'_>) -> PackagerResult<Vec<(String, Vec<u8>)>> {
        match self.context.features().support_files {
            SupportFiles::Additionals => additional_files(resolver),
            SupportFiles::CopyResourceTree => copy_resource_tree(self.context.resource_root()),
        }
    }
}

/// Evaluate the additionals template into archive entries.
fn additional_files(resolver: &OverrideResolver<'_>) -> PackagerResult<Vec<(String, Vec<u8>)>> {
    let value = resolver.evaluate_entry(ADDITIONALS_ENTRY)?;
    let Value::Object(entries) = value else {
        return Err(PackagerError::evaluation(format!(
            "{} must evaluate to an object of file contents",
            ADDITIONALS_ENTRY
        )));
    };

    let mut files = Vec::with_capacity(entries.len());
    for (name, content) in entries {
        let path = join_logical("", &name).ok_or_else(|| {
            PackagerError::evaluation(format!("{} lists an invalid path: {}", ADDITIONALS_ENTRY, name))
        })?;
        let bytes = match content {
            Value::String(text) => text.into_bytes(),
            other => to_pretty_json(&other)?.into_bytes(),
        };
        files.push((path, bytes));
    }
    Ok(files)
}

/// Every file under the resource bundle, in path order.
fn copy_resource_tree(root: &Path) -> PackagerResult<Vec<(String, Vec<u8>)>> {
    if !root.is_dir() {
        warn!("No resource bundle at {:?}, no support files added", root);
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| PackagerError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = match entry.path().strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        debug!("Copying resource {}", name);
        let content = fs::read(entry.path()).map_err(|source| PackagerError::Read {
            path: entry.path().to_path_buf(),
            source,
        })?;
        files.push((name, content));
    }
    Ok(files)
}
