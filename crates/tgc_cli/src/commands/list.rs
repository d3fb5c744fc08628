//! List command - Show platforms and template versions.

use anyhow::Result;
use clap::Args;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tgc_catalog::VersionIndex;

use super::AssetArgs;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list stable templates
    #[arg(long)]
    pub stable: bool,
}

#[derive(Tabled)]
struct PlatformRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "Template")]
    template: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Version")]
    version: String,
}

pub fn execute(args: ListArgs, assets: &AssetArgs) -> Result<()> {
    let index = assets.load_index()?;
    print!("{}", render(&index, args.stable));
    Ok(())
}

fn table<T: Tabled>(rows: &[T]) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

fn render(index: &VersionIndex, stable_only: bool) -> String {
    let platforms: Vec<PlatformRow> = index
        .platforms()
        .iter()
        .map(|p| PlatformRow {
            name: p.name.clone(),
            description: p.description.clone(),
        })
        .collect();

    let templates: Vec<TemplateRow> = index
        .templates()
        .iter()
        .filter(|t| !stable_only || t.is_stable())
        .map(|t| TemplateRow {
            template: t.name.clone(),
            description: t.description.clone(),
            status: t.status.to_string(),
            version: t.version.to_string(),
        })
        .collect();

    let mut output = String::new();
    output.push_str("\nPlatforms:\n");
    output.push_str(&table(&platforms));
    output.push_str("\n\nTemplates:\n");
    output.push_str(&table(&templates));
    output.push_str("\n\n");

    if let Ok(latest) = index.latest() {
        output.push_str(&format!("Latest version: {}\n", latest.version));
    }
    if let Ok(stable) = index.latest_stable() {
        output.push_str(&format!("Latest stable: {}\n", stable.version));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "platforms": [{"name": "docker-compose", "description": "Docker Compose"}],
        "templates": [
            {"name": "1.8", "description": "Current", "version": "1.8.12", "status": "stable"},
            {"name": "1.9", "description": "Next", "version": "1.9.2", "status": "unstable"}
        ]
    }"#;

    #[test]
    fn test_render_lists_everything() {
        let index = VersionIndex::from_json(CATALOG).unwrap();
        let output = render(&index, false);

        assert!(output.contains("docker-compose"));
        assert!(output.contains("1.9.2"));
        assert!(output.contains("Latest version: 1.9.2"));
        assert!(output.contains("Latest stable: 1.8.12"));
    }

    #[test]
    fn test_render_stable_only() {
        let index = VersionIndex::from_json(CATALOG).unwrap();
        let output = render(&index, true);

        assert!(output.contains("Current"));
        assert!(!output.contains("Next"));
    }

    #[test]
    fn test_render_empty_catalog() {
        let output = render(&VersionIndex::default(), false);
        assert!(output.contains("Platforms:"));
        assert!(!output.contains("Latest version"));
    }
}
