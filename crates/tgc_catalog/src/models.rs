//! Catalog descriptor definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version::Version;

/// Lifecycle status of a template bundle.
///
/// Unknown status names are kept as [`TemplateStatus::Other`] so a catalog
/// written for a newer configurator still loads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum TemplateStatus {
    Stable,
    Unstable,
    Deprecated,
    Other(String),
}

impl TemplateStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TemplateStatus::Stable => "stable",
            TemplateStatus::Unstable => "unstable",
            TemplateStatus::Deprecated => "deprecated",
            TemplateStatus::Other(name) => name,
        }
    }

    pub fn is_stable(&self) -> bool {
        matches!(self, TemplateStatus::Stable)
    }
}

impl From<String> for TemplateStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "stable" => TemplateStatus::Stable,
            "unstable" => TemplateStatus::Unstable,
            "deprecated" => TemplateStatus::Deprecated,
            _ => TemplateStatus::Other(value),
        }
    }
}

impl From<TemplateStatus> for String {
    fn from(status: TemplateStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TemplateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One versioned template bundle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateDescriptor {
    /// Template identifier, e.g. the minor-version label `1.8`
    pub name: String,
    pub description: String,
    pub version: Version,
    pub status: TemplateStatus,
}

impl TemplateDescriptor {
    pub fn is_stable(&self) -> bool {
        self.status.is_stable()
    }
}

/// A deployment target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformDescriptor {
    pub name: String,
    pub description: String,
}

/// Human-readable explanation of a status value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusDescriptor {
    pub name: String,
    pub description: String,
}

/// On-disk shape of `index.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub platforms: Vec<PlatformDescriptor>,
    #[serde(default)]
    pub templates: Vec<TemplateDescriptor>,
    #[serde(default)]
    pub statuses: Vec<StatusDescriptor>,
}
