//! Shared, read-only handler state.

use std::sync::Arc;

use tgc_catalog::VersionIndex;
use tgc_packager::{AssetLayout, TemplateEngine};

/// Everything a handler needs to build a packager.
///
/// Nothing here is mutated after startup, so requests never contend.
#[derive(Clone)]
pub struct ServiceState {
    pub index: Arc<VersionIndex>,
    pub layout: Arc<AssetLayout>,
    pub engine: Arc<dyn TemplateEngine>,
}

impl ServiceState {
    pub fn new(index: VersionIndex, layout: AssetLayout, engine: Arc<dyn TemplateEngine>) -> Self {
        Self {
            index: Arc::new(index),
            layout: Arc::new(layout),
            engine,
        }
    }
}
