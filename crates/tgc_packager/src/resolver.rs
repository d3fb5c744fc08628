//! Override resolver: the import callback handed to the template engine.
//!
//! Imports are answered by an ordered chain of [`ImportHandler`]s. Each
//! handler either answers the request or passes; the first answer wins.
//! The default chain is:
//!
//! 1. user configuration (`config.json` in the root directory)
//! 2. deployment configuration (`trustgraph/config.json`), evaluated on
//!    first import and reused for the rest of the request
//! 3. template version (`version.jsonnet`) as a JSON string literal
//! 4. placeholder cloud credential (`vertexai/private.json`)
//! 5. layered file lookup across the template and resource bundles
//!
//! A request no handler answers fails with `ImportNotFound`.

use std::cell::{Cell, OnceCell};
use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tracing::debug;

use crate::context::{ResolutionContext, DEPLOYMENT_CONFIG_ENTRY, DEPLOYMENT_CONFIG_PATH};
use crate::engine::{Generator, ImportResolver, ResolvedImport};
use crate::error::{PackagerError, PackagerResult};
use crate::paths::under_root;

/// Root-level import answered with the caller's configuration.
pub const USER_CONFIG_IMPORT: &str = "config.json";

/// Import answered with the bundle version.
pub const VERSION_IMPORT: &str = "version.jsonnet";

/// Credential file replaced by a placeholder, never read from disk.
pub const PLACEHOLDER_SECRET_IMPORT: &str = "vertexai/private.json";

pub const PLACEHOLDER_SECRET: &str = "Put your GCP private.json here";

/// One import request from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportRequest<'a> {
    /// Directory of the importing template, relative to the bundle root
    pub dir: &'a str,
    pub filename: &'a str,
}

/// A link in the resolution chain.
pub trait ImportHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Answer the request, or return `None` to let the next handler try.
    fn handle(
        &self,
        request: &ImportRequest<'_>,
        resolver: &OverrideResolver<'_>,
    ) -> Option<PackagerResult<ResolvedImport>>;
}

/// Injects the caller's (already normalized) configuration.
pub struct UserConfigImport;

impl ImportHandler for UserConfigImport {
    fn name(&self) -> &'static str {
        "user-config"
    }

    fn handle(
        &self,
        request: &ImportRequest<'_>,
        resolver: &OverrideResolver<'_>,
    ) -> Option<PackagerResult<ResolvedImport>> {
        if request.dir.is_empty() && request.filename == USER_CONFIG_IMPORT {
            return Some(Ok(ResolvedImport::new(
                resolver.synthetic_path(request),
                resolver.config().as_bytes(),
            )));
        }
        None
    }
}

/// Evaluates the deployment-config entry template and injects its output.
pub struct DeploymentConfigImport;

impl ImportHandler for DeploymentConfigImport {
    fn name(&self) -> &'static str {
        "deployment-config"
    }

    fn handle(
        &self,
        request: &ImportRequest<'_>,
        resolver: &OverrideResolver<'_>,
    ) -> Option<PackagerResult<ResolvedImport>> {
        if request.filename != DEPLOYMENT_CONFIG_PATH {
            return None;
        }
        let answer = resolver
            .evaluate_deployment_config()
            .and_then(|value| Ok(serde_json::to_string(&value)?))
            .map(|text| ResolvedImport::new(resolver.synthetic_path(request), text));
        Some(answer)
    }
}

/// Injects the resolved bundle version as a quoted literal.
pub struct VersionImport;

impl ImportHandler for VersionImport {
    fn name(&self) -> &'static str {
        "version"
    }

    fn handle(
        &self,
        request: &ImportRequest<'_>,
        resolver: &OverrideResolver<'_>,
    ) -> Option<PackagerResult<ResolvedImport>> {
        if request.filename != VERSION_IMPORT {
            return None;
        }
        let literal = serde_json::to_string(resolver.context().version().as_str());
        Some(
            literal
                .map(|text| ResolvedImport::new(resolver.synthetic_path(request), text))
                .map_err(PackagerError::from),
        )
    }
}

/// Answers the cloud credential import with fixed placeholder text.
pub struct PlaceholderSecretImport;

impl ImportHandler for PlaceholderSecretImport {
    fn name(&self) -> &'static str {
        "placeholder-secret"
    }

    fn handle(
        &self,
        request: &ImportRequest<'_>,
        resolver: &OverrideResolver<'_>,
    ) -> Option<PackagerResult<ResolvedImport>> {
        if request.filename == PLACEHOLDER_SECRET_IMPORT {
            return Some(Ok(ResolvedImport::new(
                resolver.synthetic_path(request),
                PLACEHOLDER_SECRET,
            )));
        }
        None
    }
}

/// First existing file among the layered candidates.
pub struct LayeredFileLookup;

impl ImportHandler for LayeredFileLookup {
    fn name(&self) -> &'static str {
        "layered-file"
    }

    fn handle(
        &self,
        request: &ImportRequest<'_>,
        resolver: &OverrideResolver<'_>,
    ) -> Option<PackagerResult<ResolvedImport>> {
        for candidate in resolver.candidates(request.dir, request.filename) {
            debug!("Try: {:?}", candidate);
            if candidate.is_file() {
                debug!("Loading: {:?}", candidate);
                let answer = fs::read(&candidate)
                    .map(|content| ResolvedImport::new(candidate.clone(), content))
                    .map_err(|source| PackagerError::Read {
                        path: candidate,
                        source,
                    });
                return Some(answer);
            }
        }
        None
    }
}

/// The standard resolution chain, in priority order.
pub fn default_handlers() -> Vec<Box<dyn ImportHandler>> {
    vec![
        Box::new(UserConfigImport),
        Box::new(DeploymentConfigImport),
        Box::new(VersionImport),
        Box::new(PlaceholderSecretImport),
        Box::new(LayeredFileLookup),
    ]
}

/// Import resolver bound to one request.
///
/// Lookups are deterministic for the lifetime of the resolver: the
/// context, the configuration and the bundle files do not change while a
/// request is being served.
pub struct OverrideResolver<'a> {
    context: &'a ResolutionContext,
    config: &'a str,
    generator: &'a Generator,
    handlers: Vec<Box<dyn ImportHandler>>,
    generating_deployment_config: Cell<bool>,
    deployment_config: OnceCell<Value>,
}

impl<'a> OverrideResolver<'a> {
    pub fn new(context: &'a ResolutionContext, config: &'a str, generator: &'a Generator) -> Self {
        Self::with_handlers(context, config, generator, default_handlers())
    }

    pub fn with_handlers(
        context: &'a ResolutionContext,
        config: &'a str,
        generator: &'a Generator,
        handlers: Vec<Box<dyn ImportHandler>>,
    ) -> Self {
        Self {
            context,
            config,
            generator,
            handlers,
            generating_deployment_config: Cell::new(false),
            deployment_config: OnceCell::new(),
        }
    }

    pub fn context(&self) -> &ResolutionContext {
        self.context
    }

    /// Normalized user configuration text.
    pub fn config(&self) -> &str {
        self.config
    }

    /// Candidate files for a layered lookup, highest priority first.
    ///
    /// Candidates escaping their bundle root are dropped.
    pub fn candidates(&self, dir: &str, filename: &str) -> Vec<PathBuf> {
        let templates = self.context.template_root();
        let resources = self.context.resource_root();

        let ordered = [
            under_root(templates, dir, filename),
            under_root(templates, "", filename),
            under_root(resources, dir, filename),
            under_root(resources, "", filename),
        ];

        let mut candidates: Vec<PathBuf> = Vec::with_capacity(ordered.len());
        for candidate in ordered.into_iter().flatten() {
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
        candidates
    }

    /// Evaluate an entry template from the template bundle root.
    pub fn evaluate_entry(&self, entry: &str) -> PackagerResult<Value> {
        let path = self.context.template_root().join(entry);
        let source = fs::read_to_string(&path).map_err(|source| PackagerError::Read {
            path: path.clone(),
            source,
        })?;
        self.generator.process(entry, &source, self)
    }

    /// Evaluate the deployment configuration.
    ///
    /// The first successful evaluation is kept for the lifetime of the
    /// resolver. Fails instead of recursing when the deployment-config
    /// template imports its own output.
    pub fn evaluate_deployment_config(&self) -> PackagerResult<Value> {
        if let Some(value) = self.deployment_config.get() {
            return Ok(value.clone());
        }
        if self.generating_deployment_config.replace(true) {
            return Err(PackagerError::evaluation(format!(
                "{} imports {} while it is being generated",
                DEPLOYMENT_CONFIG_ENTRY, DEPLOYMENT_CONFIG_PATH
            )));
        }
        let result = self.evaluate_entry(DEPLOYMENT_CONFIG_ENTRY);
        self.generating_deployment_config.set(false);
        let value = result?;
        Ok(self.deployment_config.get_or_init(|| value).clone())
    }

    /// Path reported to the engine for answers that do not come from disk.
    fn synthetic_path(&self, request: &ImportRequest<'_>) -> PathBuf {
        under_root(self.context.template_root(), request.dir, request.filename)
            .unwrap_or_else(|| self.context.template_root().join(request.filename))
    }
}

impl ImportResolver for OverrideResolver<'_> {
    fn resolve(&self, dir: &str, filename: &str) -> PackagerResult<ResolvedImport> {
        let request = ImportRequest { dir, filename };

        for handler in &self.handlers {
            if let Some(answer) = handler.handle(&request, self) {
                debug!(
                    "Import dir={} file={} answered by {}",
                    dir,
                    filename,
                    handler.name()
                );
                return answer;
            }
        }

        Err(PackagerError::ImportNotFound {
            dir: dir.to_string(),
            filename: filename.to_string(),
        })
    }
}
