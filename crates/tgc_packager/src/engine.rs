//! Template evaluation seam.
//!
//! The declarative template language is evaluated by an engine behind the
//! [`TemplateEngine`] trait. Engines call back into an [`ImportResolver`]
//! for every import the template performs, and hand back the evaluation
//! result as JSON text. [`Generator`] is the adapter the rest of the crate
//! uses: it normalizes engine failures and refuses anything that is not JSON.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{PackagerError, PackagerResult};

/// Bytes answered for one import, with the path reported to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImport {
    pub path: PathBuf,
    pub content: Vec<u8>,
}

impl ResolvedImport {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Import-resolution callback handed to a template engine.
pub trait ImportResolver {
    /// Answer an import of `filename` made from a template in `dir`.
    fn resolve(&self, dir: &str, filename: &str) -> PackagerResult<ResolvedImport>;
}

impl<F> ImportResolver for F
where
    F: Fn(&str, &str) -> PackagerResult<ResolvedImport>,
{
    fn resolve(&self, dir: &str, filename: &str) -> PackagerResult<ResolvedImport> {
        self(dir, filename)
    }
}

/// A declarative template evaluator.
///
/// Implementations must be pure with respect to their inputs: the same
/// source and the same import answers always give the same output.
pub trait TemplateEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Evaluate `source` (reported to diagnostics as `name`) and return the
    /// result as JSON text.
    fn evaluate(
        &self,
        name: &str,
        source: &str,
        imports: &dyn ImportResolver,
    ) -> PackagerResult<String>;
}

/// Adapter between the packager and a [`TemplateEngine`].
///
/// Each call is an independent evaluation; nothing is cached.
#[derive(Clone)]
pub struct Generator {
    engine: Arc<dyn TemplateEngine>,
}

impl Generator {
    pub fn new(engine: Arc<dyn TemplateEngine>) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Evaluate a template and parse its output.
    pub fn process(
        &self,
        name: &str,
        source: &str,
        imports: &dyn ImportResolver,
    ) -> PackagerResult<Value> {
        debug!("Evaluating {} with {}", name, self.engine.name());

        let output = self
            .engine
            .evaluate(name, source, imports)
            .map_err(PackagerError::evaluation_caused_by)?;

        serde_json::from_str(&output).map_err(|e| {
            PackagerError::evaluation(format!("{} did not evaluate to JSON: {}", name, e))
        })
    }
}
