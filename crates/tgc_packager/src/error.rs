//! Error types for packaging.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for packaging operations.
pub type PackagerResult<T> = Result<T, PackagerError>;

/// Errors that can occur while resolving, evaluating or packaging templates.
///
/// Every variant aborts the current request. The split between caller
/// errors and internal errors only matters at the CLI / service boundary,
/// see [`PackagerError::is_caller_error`].
#[derive(Error, Debug)]
pub enum PackagerError {
    #[error("You must select a template, or use latest / latest-stable")]
    NoTemplateSelected,

    #[error("Template {0} not known")]
    UnknownTemplate(String),

    #[error("Bad platform: {0}")]
    BadPlatform(String),

    #[error("Configuration is not valid JSON: {0}")]
    InvalidConfig(#[source] serde_json::Error),

    #[error("Could not load file={filename} dir={dir}")]
    ImportNotFound { dir: String, filename: String },

    #[error("Template evaluation failed: {message}")]
    Evaluation {
        message: String,
        #[source]
        source: Option<Box<PackagerError>>,
    },

    #[error("Template engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog error: {0}")]
    Catalog(#[from] tgc_catalog::CatalogError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl PackagerError {
    /// Build an evaluation failure from an engine diagnostic.
    pub fn evaluation(message: impl Into<String>) -> Self {
        PackagerError::Evaluation {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a failure that happened mid-evaluation, keeping it as the source.
    pub fn evaluation_caused_by(cause: PackagerError) -> Self {
        match cause {
            already @ PackagerError::Evaluation { .. } => already,
            other => PackagerError::Evaluation {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }

    /// True when the failure was caused by what the caller asked for
    /// (bad selection or malformed configuration) rather than by a missing
    /// asset or an engine fault.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            PackagerError::NoTemplateSelected
                | PackagerError::UnknownTemplate(_)
                | PackagerError::BadPlatform(_)
                | PackagerError::InvalidConfig(_)
                | PackagerError::Unsupported(_)
                | PackagerError::Catalog(tgc_catalog::CatalogError::InvalidVersion { .. })
        )
    }

    /// The import failure buried in an evaluation error, if any.
    pub fn import_not_found(&self) -> Option<(&str, &str)> {
        match self {
            PackagerError::ImportNotFound { dir, filename } => Some((dir, filename)),
            PackagerError::Evaluation {
                source: Some(inner),
                ..
            } => inner.import_not_found(),
            _ => None,
        }
    }
}
