//! Mock template engine for testing.
//!
//! Provides an in-process [`TemplateEngine`] so the resolver and the
//! packager can be exercised without an external Jsonnet binary.
//!
//! Templates are plain JSON documents with two directives:
//!
//! - `{"$import": "name"}` is replaced by the JSON value of the import
//! - `{"$importstr": "name"}` is replaced by the import's text
//!
//! Nested imports are resolved relative to the directory of the file that
//! contains them, like Jsonnet does.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::engine::{ImportResolver, TemplateEngine};
use crate::error::{PackagerError, PackagerResult};
use crate::paths::{join_logical, parent_of};

const MAX_IMPORT_DEPTH: usize = 64;

/// Import captured by the mock engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImport {
    pub dir: String,
    pub filename: String,
}

/// In-process engine evaluating JSON templates with import directives.
#[derive(Clone, Default)]
pub struct MockEngine {
    captured: Arc<Mutex<Vec<CapturedImport>>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every import requested so far, in order.
    pub fn captured_imports(&self) -> Vec<CapturedImport> {
        self.captured.lock().clone()
    }

    /// Whether `filename` was imported at least once.
    pub fn was_imported(&self, filename: &str) -> bool {
        self.captured.lock().iter().any(|c| c.filename == filename)
    }

    pub fn clear(&self) {
        self.captured.lock().clear();
    }

    fn expand(
        &self,
        value: Value,
        dir: &str,
        imports: &dyn ImportResolver,
        depth: usize,
    ) -> PackagerResult<Value> {
        if depth > MAX_IMPORT_DEPTH {
            return Err(PackagerError::evaluation("max import depth exceeded"));
        }

        match value {
            Value::Object(map) => {
                if let Some((directive, target)) = directive_of(&map) {
                    return self.import(directive, &target, dir, imports, depth);
                }
                let mut expanded = Map::new();
                for (key, child) in map {
                    expanded.insert(key, self.expand(child, dir, imports, depth)?);
                }
                Ok(Value::Object(expanded))
            }
            Value::Array(items) => items
                .into_iter()
                .map(|item| self.expand(item, dir, imports, depth))
                .collect::<PackagerResult<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other),
        }
    }

    fn import(
        &self,
        directive: Directive,
        target: &str,
        dir: &str,
        imports: &dyn ImportResolver,
        depth: usize,
    ) -> PackagerResult<Value> {
        self.captured.lock().push(CapturedImport {
            dir: dir.to_string(),
            filename: target.to_string(),
        });

        let resolved = imports.resolve(dir, target)?;
        let text = String::from_utf8(resolved.content).map_err(|_| {
            PackagerError::evaluation(format!("import {} is not valid UTF-8", target))
        })?;

        match directive {
            Directive::ImportStr => Ok(Value::String(text)),
            Directive::Import => {
                let nested: Value = serde_json::from_str(&text).map_err(|e| {
                    PackagerError::evaluation(format!("{}: syntax error: {}", target, e))
                })?;
                let child_dir = join_logical(dir, target)
                    .map(|path| parent_of(&path).to_string())
                    .unwrap_or_default();
                self.expand(nested, &child_dir, imports, depth + 1)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Directive {
    Import,
    ImportStr,
}

fn directive_of(map: &Map<String, Value>) -> Option<(Directive, String)> {
    if map.len() != 1 {
        return None;
    }
    if let Some(Value::String(target)) = map.get("$import") {
        return Some((Directive::Import, target.clone()));
    }
    if let Some(Value::String(target)) = map.get("$importstr") {
        return Some((Directive::ImportStr, target.clone()));
    }
    None
}

impl TemplateEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn evaluate(
        &self,
        name: &str,
        source: &str,
        imports: &dyn ImportResolver,
    ) -> PackagerResult<String> {
        let value: Value = serde_json::from_str(source)
            .map_err(|e| PackagerError::evaluation(format!("{}: syntax error: {}", name, e)))?;
        let expanded = self.expand(value, "", imports, 0)?;
        Ok(serde_json::to_string(&expanded)?)
    }
}
