//! Logical import paths.
//!
//! Import requests arrive as a `(directory, filename)` pair where the
//! directory is relative to the bundle root (empty for the root itself).
//! These helpers normalize such pairs lexically and refuse anything that
//! would climb above the root.

use std::path::{Path, PathBuf};

/// Join a logical directory and an import name, resolving `.` and `..`.
///
/// Returns `None` for absolute names, for paths that escape the root and
/// for paths that normalize to the root itself.
pub fn join_logical(dir: &str, name: &str) -> Option<String> {
    if name.starts_with('/') || name.starts_with('\\') {
        return None;
    }

    let mut parts: Vec<&str> = Vec::new();
    for part in dir.split('/').chain(name.split('/')) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Directory part of a logical path, empty for root-level files.
pub fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Map a logical `(dir, name)` pair below a filesystem root.
pub fn under_root(root: &Path, dir: &str, name: &str) -> Option<PathBuf> {
    join_logical(dir, name).map(|relative| root.join(relative))
}
