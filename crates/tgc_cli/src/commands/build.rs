//! Build command - Package a configuration for a platform.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tgc_catalog::VersionIndex;
use tgc_packager::{
    Artifact, AssetLayout, OutputMode, Packager, Selection, TemplateEngine, DEFAULT_PLATFORM,
};
use tracing::info;

use super::AssetArgs;

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Template to use (e.g. 1.8)
    #[arg(short, long)]
    pub template: Option<String>,

    /// Template version (default: highest in the catalog)
    #[arg(id = "template_version", long = "template-version")]
    pub version: Option<String>,

    /// Target platform
    #[arg(short, long, default_value = DEFAULT_PLATFORM)]
    pub platform: String,

    /// Input configuration file
    #[arg(short, long, default_value = "config.json")]
    pub input: PathBuf,

    /// Output archive
    #[arg(short, long, default_value = "output.zip")]
    pub output: PathBuf,

    /// Use the latest version (overrides --template)
    #[arg(long)]
    pub latest: bool,

    /// Use the latest stable version (overrides --template)
    #[arg(long)]
    pub latest_stable: bool,

    /// Print only the deployment configuration (JSON) to stdout
    #[arg(short = 'O', long, conflicts_with = "resources_only")]
    pub config_only: bool,

    /// Print only the platform resources (YAML) to stdout
    #[arg(short = 'R', long)]
    pub resources_only: bool,
}

impl BuildArgs {
    pub fn selection(&self) -> Selection {
        let mut selection = Selection::new(&self.platform)
            .with_latest(self.latest)
            .with_latest_stable(self.latest_stable);
        if let Some(template) = &self.template {
            selection = selection.with_template(template);
        }
        if let Some(version) = &self.version {
            selection = selection.with_version(version);
        }
        selection
    }

    pub fn mode(&self) -> OutputMode {
        if self.config_only {
            OutputMode::DeploymentConfig
        } else if self.resources_only {
            OutputMode::Resources
        } else {
            OutputMode::Archive
        }
    }
}

pub fn execute(args: BuildArgs, assets: &AssetArgs) -> Result<()> {
    let index = assets.load_index()?;
    let stdout = std::io::stdout();
    run(&args, &index, &assets.layout(), assets.engine(), &mut stdout.lock())
}

/// Package and deliver: archives go to the output file, documents to `out`.
fn run(
    args: &BuildArgs,
    index: &VersionIndex,
    layout: &AssetLayout,
    engine: Arc<dyn TemplateEngine>,
    out: &mut dyn Write,
) -> Result<()> {
    let config = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read configuration {:?}", args.input))?;

    let packager = Packager::new(&args.selection(), index, layout, engine)?;

    match packager.package(&config, args.mode())? {
        Artifact::Archive(bytes) => {
            info!("Writing output file...");
            fs::write(&args.output, &bytes)
                .with_context(|| format!("Failed to write {:?}", args.output))?;
            info!("Wrote {}.", args.output.display());
        }
        Artifact::Document(text) => {
            out.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                out.write_all(b"\n")?;
            }
            out.flush()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};
    use tgc_packager::{read_entries, MockEngine};

    const CATALOG: &str = r#"{
        "templates": [
            {"name": "1.8", "description": "Current", "version": "1.8.12", "status": "stable"}
        ]
    }"#;

    fn fixture() -> (TempDir, AssetLayout, VersionIndex) {
        let dir = tempdir().unwrap();
        let layout = AssetLayout::new(dir.path().join("templates"), dir.path().join("resources"));
        let bundle = layout.templates_dir.join("1.8");
        fs::create_dir_all(&bundle).unwrap();
        fs::write(
            bundle.join("trustgraph-config.jsonnet"),
            r#"{"flows": {"$import": "config.json"}}"#,
        )
        .unwrap();
        fs::write(
            bundle.join("config-to-docker-compose.jsonnet"),
            r#"{"services": {"api": {"image": "trustgraph/api"}}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("config.json"), r#"[{"name": "pulsar"}]"#).unwrap();

        let index = VersionIndex::from_json(CATALOG).unwrap();
        (dir, layout, index)
    }

    fn args(dir: &TempDir) -> BuildArgs {
        BuildArgs {
            template: Some("1.8".to_string()),
            version: None,
            platform: DEFAULT_PLATFORM.to_string(),
            input: dir.path().join("config.json"),
            output: dir.path().join("output.zip"),
            latest: false,
            latest_stable: false,
            config_only: false,
            resources_only: false,
        }
    }

    #[test]
    fn test_archive_written_to_output() {
        let (dir, layout, index) = fixture();
        let args = args(&dir);
        let mut out = Vec::new();

        run(&args, &index, &layout, Arc::new(MockEngine::new()), &mut out).unwrap();

        assert!(out.is_empty());
        let entries = read_entries(&fs::read(&args.output).unwrap()).unwrap();
        assert_eq!(entries[0].0, "docker-compose.yaml");
    }

    #[test]
    fn test_config_only_prints_document() {
        let (dir, layout, index) = fixture();
        let mut args = args(&dir);
        args.config_only = true;
        let mut out = Vec::new();

        run(&args, &index, &layout, Arc::new(MockEngine::new()), &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("{\n    \"flows\""));
        assert!(printed.ends_with("}\n"));
        assert!(!args.output.exists());
    }

    #[test]
    fn test_resources_only_prints_yaml() {
        let (dir, layout, index) = fixture();
        let mut args = args(&dir);
        args.resources_only = true;
        let mut out = Vec::new();

        run(&args, &index, &layout, Arc::new(MockEngine::new()), &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("services:"));
        assert!(printed.contains("image: trustgraph/api"));
    }

    #[test]
    fn test_latest_stable_overrides_template() {
        let (dir, layout, index) = fixture();
        for template in ["1.6", "1.7", "1.8"] {
            let mut args = args(&dir);
            args.template = Some(template.to_string());
            args.latest_stable = true;
            args.config_only = true;
            let mut out = Vec::new();

            run(&args, &index, &layout, Arc::new(MockEngine::new()), &mut out).unwrap();
            assert!(String::from_utf8(out).unwrap().contains("\"pulsar\""));
        }
    }

    #[test]
    fn test_missing_input_fails() {
        let (dir, layout, index) = fixture();
        let mut args = args(&dir);
        args.input = dir.path().join("absent.json");

        let err = run(&args, &index, &layout, Arc::new(MockEngine::new()), &mut Vec::new())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read configuration"));
    }
}
