// ─── Archive Loader ───
// Read-only, in-memory view over a modpack zip. Nothing touches disk.

use std::io::{Cursor, Read};

use tracing::debug;

use crate::core::error::{ValidatorError, ValidatorResult};

/// A single file entry in the archive's central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Virtual path using `/` separators (e.g. `overrides/mods/foo.jar`).
    pub path: String,
    /// Uncompressed size in bytes, as declared by the archive.
    pub size: u64,
    /// Position in the central directory.
    index: usize,
}

/// Immutable archive bytes plus the ordered entry index built at load time.
#[derive(Debug, Clone)]
pub struct ModpackArchive {
    bytes: Vec<u8>,
    entries: Vec<ArchiveEntry>,
}

impl ModpackArchive {
    /// Index the archive's central directory.
    ///
    /// Fails with `CorruptArchive` when the bytes are not a readable zip.
    /// Directory entries are skipped.
    pub fn load(bytes: Vec<u8>) -> ValidatorResult<Self> {
        let entries = index_entries(&bytes)?;

        debug!(
            "Indexed archive: {} entries, {} bytes",
            entries.len(),
            bytes.len()
        );

        Ok(Self { bytes, entries })
    }

    /// Entries in central-directory order.
    pub fn entries(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn contains(&self, path: &str) -> bool {
        let wanted = normalize_path(path);
        self.entries.iter().any(|e| e.path == wanted)
    }

    /// Read and decompress a single entry.
    ///
    /// Decompression and checksum failures are `CorruptArchive`.
    pub fn read_entry(&self, path: &str) -> ValidatorResult<Vec<u8>> {
        let wanted = normalize_path(path);
        let entry = self
            .entries
            .iter()
            .find(|e| e.path == wanted)
            .ok_or_else(|| ValidatorError::EntryNotFound(wanted.clone()))?;

        let mut archive = zip::ZipArchive::new(Cursor::new(self.bytes.as_slice()))
            .map_err(|e| ValidatorError::CorruptArchive(e.to_string()))?;
        let mut file = archive
            .by_index(entry.index)
            .map_err(|e| ValidatorError::CorruptArchive(e.to_string()))?;

        // Declared sizes are attacker-controlled; never preallocate from them.
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| ValidatorError::CorruptArchive(format!("{}: {}", wanted, e)))?;
        Ok(buf)
    }

    /// Read an entry as UTF-8 text, dropping a leading BOM if present.
    pub fn read_entry_string(&self, path: &str) -> ValidatorResult<String> {
        let bytes = self.read_entry(path)?;
        let text = String::from_utf8(bytes).map_err(|e| ValidatorError::MalformedManifest {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        })
    }
}

fn index_entries(bytes: &[u8]) -> ValidatorResult<Vec<ArchiveEntry>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ValidatorError::CorruptArchive(e.to_string()))?;

    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let file = archive
            .by_index(index)
            .map_err(|e| ValidatorError::CorruptArchive(e.to_string()))?;
        if file.is_dir() {
            continue;
        }
        entries.push(ArchiveEntry {
            path: normalize_path(file.name()),
            size: file.size(),
            index,
        });
    }
    Ok(entries)
}

fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}
