//! Jsonnet engine backed by an external binary.
//!
//! The Jsonnet evaluator is not linked in-process. Instead every evaluation
//! gets a private staging directory: the entry template is written there,
//! its `import` / `importstr` / `importbin` directives are answered through
//! the [`ImportResolver`] and each answer is written at the path the
//! evaluator will look for it. The binary (`jsonnet`, `jrsonnet`, or any
//! CLI-compatible evaluator) then runs against the staged tree, so it only
//! ever sees what the resolver decided.
//!
//! Staging is lexical, so it also meets directives the evaluator never
//! reaches (comments, untaken branches). A resolver failure during staging
//! is therefore only recorded: if the evaluator succeeds it is dropped, if
//! the evaluator fails it becomes the error source.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::engine::{ImportResolver, TemplateEngine};
use crate::error::{PackagerError, PackagerResult};
use crate::paths::{join_logical, parent_of};

const ENTRY_FILE: &str = ".tgc-entry.jsonnet";

/// Import keyword found in template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// Jsonnet code, scanned for further imports
    Import,
    /// Raw text
    ImportStr,
    /// Raw bytes
    ImportBin,
}

fn import_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"\b(importstr|importbin|import)\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')"#,
        )
        .expect("import pattern is valid")
    })
}

/// Find the import directives in a template source, in source order.
///
/// The scan is lexical: a directive inside a comment or a text block is
/// reported too. Callers treat those as optional.
pub fn import_directives(source: &str) -> Vec<(ImportKind, String)> {
    import_pattern()
        .captures_iter(source)
        .filter_map(|caps| {
            let kind = match &caps[1] {
                "importstr" => ImportKind::ImportStr,
                "importbin" => ImportKind::ImportBin,
                _ => ImportKind::Import,
            };
            let target = caps.get(2).or_else(|| caps.get(3))?.as_str();
            Some((kind, target.to_string()))
        })
        .collect()
}

/// Engine that shells out to a Jsonnet command-line evaluator.
#[derive(Debug, Clone)]
pub struct JsonnetCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl Default for JsonnetCommand {
    fn default() -> Self {
        Self::new("jsonnet")
    }
}

impl JsonnetCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Extra argument passed before the entry file, e.g. `--max-stack`.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Check whether the evaluator binary can be launched.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl TemplateEngine for JsonnetCommand {
    fn name(&self) -> &str {
        "jsonnet"
    }

    fn evaluate(
        &self,
        name: &str,
        source: &str,
        imports: &dyn ImportResolver,
    ) -> PackagerResult<String> {
        let staging = tempfile::Builder::new().prefix("tgc-eval-").tempdir()?;

        let mut stager = Stager::new(staging.path(), imports);
        stager.stage(ImportKind::Import, "", source)?;

        let entry = staging.path().join(ENTRY_FILE);
        fs::write(&entry, source)?;

        debug!(
            "Running {} on {} ({} staged imports)",
            self.program.display(),
            name,
            stager.staged.len()
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&entry)
            .current_dir(staging.path())
            .output()
            .map_err(|e| {
                PackagerError::EngineUnavailable(format!("{}: {}", self.program.display(), e))
            })?;

        if output.status.success() {
            return String::from_utf8(output.stdout).map_err(|_| {
                PackagerError::evaluation(format!("{} produced non UTF-8 output", name))
            });
        }

        let prefix = format!("{}/", staging.path().display());
        let diagnostic = String::from_utf8_lossy(&output.stderr)
            .replace(&prefix, "")
            .replace(ENTRY_FILE, name)
            .trim()
            .to_string();

        let source = stager.cause_of(&diagnostic);
        Err(PackagerError::Evaluation {
            message: diagnostic,
            source: source.map(Box::new),
        })
    }
}

/// Writes resolver answers into the staging directory.
struct Stager<'a> {
    root: &'a Path,
    imports: &'a dyn ImportResolver,
    staged: HashSet<String>,
    /// Failed imports, keyed by the import target as written
    deferred: Vec<(String, PackagerError)>,
}

impl<'a> Stager<'a> {
    fn new(root: &'a Path, imports: &'a dyn ImportResolver) -> Self {
        Self {
            root,
            imports,
            staged: HashSet::new(),
            deferred: Vec::new(),
        }
    }

    /// Answer every import directive in `source`, a file living in `dir`.
    fn stage(&mut self, kind: ImportKind, dir: &str, source: &str) -> PackagerResult<()> {
        if kind != ImportKind::Import {
            return Ok(());
        }

        for (child_kind, target) in import_directives(source) {
            let logical = join_logical(dir, &target).ok_or_else(|| {
                PackagerError::evaluation(format!(
                    "import {} from dir={} escapes the template root",
                    target, dir
                ))
            })?;

            // First answer for a location wins
            if !self.staged.insert(logical.clone()) {
                continue;
            }

            match self.imports.resolve(dir, &target) {
                Ok(resolved) => {
                    let dest = self.root.join(&logical);
                    if let Some(parent) = dest.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&dest, &resolved.content)?;

                    if child_kind == ImportKind::Import {
                        match std::str::from_utf8(&resolved.content) {
                            Ok(text) => self.stage(child_kind, parent_of(&logical), text)?,
                            Err(_) => warn!("Import {} is not UTF-8, not scanned", logical),
                        }
                    }
                }
                Err(e) => {
                    debug!("Deferring failed import {}: {}", logical, e);
                    self.deferred.push((target, e));
                }
            }
        }

        Ok(())
    }

    /// The deferred failure the evaluator tripped over, judged by the
    /// import target named in its diagnostic. Falls back to the first one.
    fn cause_of(self, diagnostic: &str) -> Option<PackagerError> {
        let mut deferred = self.deferred;
        let index = deferred
            .iter()
            .position(|(target, _)| diagnostic.contains(target.as_str()))
            .unwrap_or(0);
        (index < deferred.len()).then(|| deferred.swap_remove(index).1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ResolvedImport;
    use tempfile::tempdir;

    #[test]
    fn test_import_directives() {
        let source = r#"
            local config = import "config.json";
            local version = import 'version.jsonnet';
            local dash = importstr "grafana/dashboard.json";
            local key = importbin "vertexai/private.json";
            { importer: "not an import" }
        "#;

        let found = import_directives(source);
        assert_eq!(
            found,
            vec![
                (ImportKind::Import, "config.json".to_string()),
                (ImportKind::Import, "version.jsonnet".to_string()),
                (ImportKind::ImportStr, "grafana/dashboard.json".to_string()),
                (ImportKind::ImportBin, "vertexai/private.json".to_string()),
            ]
        );
    }

    #[test]
    fn test_stager_writes_answers_at_relative_paths() {
        let root = tempdir().unwrap();
        let fetch = |dir: &str, filename: &str| -> PackagerResult<ResolvedImport> {
            let content = match (dir, filename) {
                ("", "components/pulsar.jsonnet") => "import 'images.jsonnet'",
                ("components", "images.jsonnet") => "{ pulsar: 'apachepulsar/pulsar' }",
                ("", "config.json") => "[]",
                _ => {
                    return Err(PackagerError::ImportNotFound {
                        dir: dir.to_string(),
                        filename: filename.to_string(),
                    })
                }
            };
            Ok(ResolvedImport::new(filename, content))
        };

        let mut stager = Stager::new(root.path(), &fetch);
        stager
            .stage(
                ImportKind::Import,
                "",
                r#"import "config.json" + import "components/pulsar.jsonnet" // import "gone.jsonnet""#,
            )
            .unwrap();

        assert_eq!(
            fs::read_to_string(root.path().join("config.json")).unwrap(),
            "[]"
        );
        assert_eq!(
            fs::read_to_string(root.path().join("components/images.jsonnet")).unwrap(),
            "{ pulsar: 'apachepulsar/pulsar' }"
        );
        // Unresolved imports are deferred, not fatal
        assert_eq!(stager.deferred.len(), 1);
        assert_eq!(
            stager.deferred[0].1.import_not_found(),
            Some(("", "gone.jsonnet"))
        );
    }

    #[test]
    fn test_stager_defers_every_failure() {
        let root = tempdir().unwrap();
        let fetch = |dir: &str, filename: &str| -> PackagerResult<ResolvedImport> {
            match filename {
                "trustgraph/config.json" => Err(PackagerError::Read {
                    path: PathBuf::from("trustgraph-config.jsonnet"),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                }),
                "config.json" => Ok(ResolvedImport::new(filename, "[]")),
                _ => Err(PackagerError::ImportNotFound {
                    dir: dir.to_string(),
                    filename: filename.to_string(),
                }),
            }
        };

        let mut stager = Stager::new(root.path(), &fetch);
        stager
            .stage(
                ImportKind::Import,
                "",
                "// local tg = import \"trustgraph/config.json\";\nimport \"config.json\" + import \"absent.jsonnet\"",
            )
            .unwrap();
        assert_eq!(stager.deferred.len(), 2);
        assert!(root.path().join("config.json").is_file());

        let cause = stager
            .cause_of("RUNTIME ERROR: couldn't open import \"absent.jsonnet\"")
            .unwrap();
        assert_eq!(cause.import_not_found(), Some(("", "absent.jsonnet")));
    }

    #[test]
    fn test_cause_without_failures() {
        let root = tempdir().unwrap();
        let fetch = |_: &str, filename: &str| -> PackagerResult<ResolvedImport> {
            Ok(ResolvedImport::new(filename, "{}"))
        };
        let stager = Stager::new(root.path(), &fetch);
        assert!(stager.cause_of("syntax error").is_none());
    }

    #[test]
    fn test_stager_rejects_escaping_import() {
        let root = tempdir().unwrap();
        let fetch = |_: &str, filename: &str| -> PackagerResult<ResolvedImport> {
            Ok(ResolvedImport::new(filename, "{}"))
        };

        let mut stager = Stager::new(root.path(), &fetch);
        let err = stager
            .stage(ImportKind::Import, "", r#"import "../../etc/passwd""#)
            .unwrap_err();
        assert!(err.to_string().contains("escapes"));
    }

    #[test]
    fn test_missing_binary_reports_engine_unavailable() {
        let engine = JsonnetCommand::new("/nonexistent/tgc-jsonnet");
        assert!(!engine.is_available());

        let fetch = |_: &str, filename: &str| -> PackagerResult<ResolvedImport> {
            Ok(ResolvedImport::new(filename, "{}"))
        };
        let err = engine.evaluate("snippet", "{}", &fetch).unwrap_err();
        assert!(matches!(err, PackagerError::EngineUnavailable(_)));
    }

    #[test]
    fn test_evaluates_with_installed_binary() {
        let engine = JsonnetCommand::default();
        if !engine.is_available() {
            eprintln!("jsonnet not installed, skipping");
            return;
        }

        let fetch = |_: &str, filename: &str| -> PackagerResult<ResolvedImport> {
            Ok(ResolvedImport::new(filename, r#"{ replicas: 2 }"#))
        };
        let output = engine
            .evaluate(
                "snippet",
                "local c = import 'config.json'; { doubled: c.replicas * 2 }",
                &fetch,
            )
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["doubled"], 4);
    }
}
