//! CLI command definitions.
//!
//! Each subcommand maps to one front end of the packaging pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tgc_catalog::VersionIndex;
use tgc_packager::{AssetLayout, JsonnetCommand, TemplateEngine};
use tracing::warn;

pub mod build;
pub mod list;
pub mod serve;

/// TrustGraph configurator - deployment bundles from a JSON configuration
#[derive(Parser)]
#[command(name = "tg-configurator")]
#[command(version, about = "Build TrustGraph deployment bundles from a JSON configuration")]
#[command(long_about = r#"
Evaluates a versioned template bundle against a JSON configuration and
packages the result for a deployment platform.

COMMANDS:
  build  → Build an archive, or print the deployment config or resources
  list   → List platforms and template versions
  serve  → Run the configuration HTTP service

EXIT CODES:
  0 - Success
  1 - Failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub assets: AssetArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a deployment archive or a single document
    Build(build::BuildArgs),

    /// List platforms and template versions
    List(list::ListArgs),

    /// Run the HTTP service
    Serve(serve::ServeArgs),
}

/// Where templates, resources and the evaluator live.
#[derive(Args, Debug, Clone)]
pub struct AssetArgs {
    /// Template bundles directory
    #[arg(long, global = true, env = "TGC_TEMPLATES_DIR", default_value = "templates")]
    pub templates_dir: PathBuf,

    /// Resource bundles directory
    #[arg(long, global = true, env = "TGC_RESOURCES_DIR", default_value = "resources")]
    pub resources_dir: PathBuf,

    /// Catalog file (default: <templates-dir>/index.json)
    #[arg(long, global = true, env = "TGC_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Jsonnet evaluator binary
    #[arg(long, global = true, env = "TGC_JSONNET", default_value = "jsonnet")]
    pub jsonnet: PathBuf,
}

impl AssetArgs {
    pub fn layout(&self) -> AssetLayout {
        AssetLayout::new(&self.templates_dir, &self.resources_dir)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.catalog
            .clone()
            .unwrap_or_else(|| self.layout().catalog_path())
    }

    pub fn load_index(&self) -> Result<VersionIndex> {
        let path = self.catalog_path();
        VersionIndex::load(&path).with_context(|| format!("Failed to load catalog {:?}", path))
    }

    pub fn engine(&self) -> Arc<dyn TemplateEngine> {
        let engine = JsonnetCommand::new(&self.jsonnet);
        if !engine.is_available() {
            warn!(
                "Jsonnet evaluator {:?} could not be started, evaluations will fail",
                engine.program()
            );
        }
        Arc::new(engine)
    }
}
