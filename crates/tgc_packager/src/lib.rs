//! # tgc_packager
//!
//! Template resolution and deployment packaging for the TrustGraph
//! configurator.
//!
//! This crate turns a user configuration (JSON) into a deployable
//! artifact by evaluating a versioned template bundle against it.
//!
//! # Features
//!
//! - **Pluggable Engines**: Jsonnet via an external binary, or the in-process mock
//! - **Override Resolution**: synthetic imports plus layered template/resource lookup
//! - **Version Gating**: older bundles skip outputs they predate
//! - **Deterministic Archives**: identical inputs give byte-identical zip output
//! - **Partial Output**: deployment config or resources alone, without archiving
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tgc_catalog::VersionIndex;
//! use tgc_packager::{AssetLayout, JsonnetCommand, OutputMode, Packager, Selection};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let layout = AssetLayout::new("templates", "resources");
//!     let index = VersionIndex::load(layout.catalog_path())?;
//!
//!     let selection = Selection::new("docker-compose").with_latest_stable(true);
//!     let packager = Packager::new(&selection, &index, &layout, Arc::new(JsonnetCommand::default()))?;
//!
//!     let config = std::fs::read_to_string("config.json")?;
//!     let artifact = packager.package(&config, OutputMode::Archive)?;
//!     std::fs::write("output.zip", artifact.into_bytes())?;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod context;
pub mod engine;
pub mod error;
pub mod jsonnet;
pub mod mock;
pub mod packager;
pub mod paths;
pub mod resolver;

pub use archive::{read_entries, ArchiveBuilder};
pub use context::{
    AssetLayout, FeatureSupport, Platform, PlatformFamily, ResolutionContext, SupportFiles,
    ADDITIONALS_ENTRY, DEPLOYMENT_CONFIG_ENTRY, DEPLOYMENT_CONFIG_MIN_VERSION, DEPLOYMENT_CONFIG_PATH,
};
pub use engine::{Generator, ImportResolver, ResolvedImport, TemplateEngine};
pub use error::{PackagerError, PackagerResult};
pub use jsonnet::{import_directives, ImportKind, JsonnetCommand};
pub use mock::{CapturedImport, MockEngine};
pub use packager::{
    normalize_config, to_pretty_json, Artifact, OutputMode, Packager, Selection, DEFAULT_PLATFORM,
};
pub use resolver::{default_handlers, ImportHandler, ImportRequest, OverrideResolver};
