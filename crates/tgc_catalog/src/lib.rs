//! # tgc_catalog
//!
//! Template bundle catalog for the TrustGraph configurator.
//!
//! The catalog (`templates/index.json`) lists every published template
//! bundle with its version and lifecycle status, plus the deployment
//! platforms the configurator can target. This crate loads it and answers
//! the version questions the packager asks: which versions exist for a
//! template, which one is the latest, which one is the latest stable.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tgc_catalog::VersionIndex;
//!
//! let index = VersionIndex::load("templates/index.json").unwrap();
//! let stable = index.latest_stable().unwrap();
//! println!("{} {}", stable.name, stable.version);
//! ```

pub mod error;
pub mod index;
pub mod models;
pub mod version;

pub use error::{CatalogError, CatalogResult};
pub use index::VersionIndex;
pub use models::{Catalog, PlatformDescriptor, StatusDescriptor, TemplateDescriptor, TemplateStatus};
pub use version::Version;
