//! Version index over the template catalog.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Catalog, PlatformDescriptor, StatusDescriptor, TemplateDescriptor};

/// Read-only index of template bundles and platforms.
///
/// The index is loaded once and never mutated, so it can be shared between
/// concurrent packaging requests behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct VersionIndex {
    catalog: Catalog,
}

impl VersionIndex {
    /// Build an index from an already parsed catalog.
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Load the catalog from an `index.json` file.
    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        debug!("Loading catalog from {:?}", path);

        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_json(&content)?;

        info!(
            "Loaded catalog: {} templates, {} platforms",
            index.catalog.templates.len(),
            index.catalog.platforms.len()
        );
        Ok(index)
    }

    /// Parse the catalog from JSON text.
    ///
    /// A template listing the same version twice is rejected, including
    /// spellings that compare equal such as `1.0` and `1.0.0`.
    pub fn from_json(content: &str) -> CatalogResult<Self> {
        let catalog: Catalog = serde_json::from_str(content)?;
        check_duplicates(&catalog)?;
        Ok(Self::new(catalog))
    }

    /// All template descriptors in catalog order.
    pub fn templates(&self) -> &[TemplateDescriptor] {
        &self.catalog.templates
    }

    pub fn platforms(&self) -> &[PlatformDescriptor] {
        &self.catalog.platforms
    }

    pub fn statuses(&self) -> &[StatusDescriptor] {
        &self.catalog.statuses
    }

    /// Templates with stable status, in catalog order.
    pub fn stable(&self) -> Vec<&TemplateDescriptor> {
        self.catalog
            .templates
            .iter()
            .filter(|t| t.is_stable())
            .collect()
    }

    /// All templates sorted by ascending version. Ties keep catalog order.
    pub fn sorted(&self) -> Vec<&TemplateDescriptor> {
        let mut templates: Vec<_> = self.catalog.templates.iter().collect();
        templates.sort_by(|a, b| a.version.cmp(&b.version));
        templates
    }

    /// Every version published under a template name, in catalog order.
    pub fn versions_of(&self, name: &str) -> Vec<&TemplateDescriptor> {
        self.catalog
            .templates
            .iter()
            .filter(|t| t.name == name)
            .collect()
    }

    pub fn contains_template(&self, name: &str) -> bool {
        self.catalog.templates.iter().any(|t| t.name == name)
    }

    /// Highest version across the whole catalog.
    pub fn latest(&self) -> CatalogResult<&TemplateDescriptor> {
        max_version(self.catalog.templates.iter())
            .ok_or_else(|| CatalogError::NotFound("no templates in catalog".to_string()))
    }

    /// Highest stable version across the whole catalog.
    pub fn latest_stable(&self) -> CatalogResult<&TemplateDescriptor> {
        max_version(self.catalog.templates.iter().filter(|t| t.is_stable()))
            .ok_or_else(|| CatalogError::NotFound("no stable templates in catalog".to_string()))
    }

    /// Highest version published under a template name.
    pub fn latest_of(&self, name: &str) -> CatalogResult<&TemplateDescriptor> {
        max_version(self.catalog.templates.iter().filter(|t| t.name == name))
            .ok_or_else(|| CatalogError::NotFound(format!("template {}", name)))
    }
}

fn check_duplicates(catalog: &Catalog) -> CatalogResult<()> {
    for (i, template) in catalog.templates.iter().enumerate() {
        let earlier = catalog.templates[..i]
            .iter()
            .find(|t| t.name == template.name && t.version == template.version);
        if let Some(previous) = earlier {
            return Err(CatalogError::DuplicateVersion {
                name: template.name.clone(),
                version: template.version.to_string(),
                previous: previous.version.to_string(),
            });
        }
    }
    Ok(())
}

/// Maximum by version; on equal versions the later catalog entry wins,
/// matching the last element of a stable ascending sort.
fn max_version<'a>(
    templates: impl Iterator<Item = &'a TemplateDescriptor>,
) -> Option<&'a TemplateDescriptor> {
    templates.max_by(|a, b| a.version.cmp(&b.version))
}
