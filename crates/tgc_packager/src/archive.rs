//! Deterministic zip archives.

use std::collections::HashSet;
use std::io::{Cursor, Read, Write};

use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::PackagerResult;

const FILE_MODE: u32 = 0o644;

/// In-memory archive writer.
///
/// Every entry is a deflated regular file with mode 0644 and the zip epoch
/// (1980-01-01 00:00) as its timestamp, so the same entries in the same
/// order always give the same bytes.
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    names: HashSet<String>,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            names: HashSet::new(),
        }
    }

    fn options() -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(FILE_MODE)
    }

    /// Add a file entry. A name already in the archive is skipped.
    pub fn add(&mut self, name: &str, content: &[u8]) -> PackagerResult<()> {
        if !self.names.insert(name.to_string()) {
            warn!("Duplicate archive entry {}, keeping the first", name);
            return Ok(());
        }

        info!("Adding {}...", name);

        self.writer.start_file(name, Self::options())?;
        self.writer.write_all(content)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Write the central directory and return the archive bytes.
    pub fn finish(self) -> PackagerResult<Vec<u8>> {
        Ok(self.writer.finish()?.into_inner())
    }
}

/// Read every file entry of an archive, in archive order.
pub fn read_entries(bytes: &[u8]) -> PackagerResult<Vec<(String, Vec<u8>)>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        entries.push((name, content));
    }

    Ok(entries)
}
