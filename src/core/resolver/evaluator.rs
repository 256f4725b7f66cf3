// ─── Mod Resolvability ───
// Which manifest files can't be fetched automatically, and which of those
// the archive already ships under its overrides folder.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::metadata::{MetadataIndex, RemoteFileMetadata};
use crate::core::archive::ModpackArchive;
use crate::core::manifest::model::dedupe_by_file_name;
use crate::core::manifest::{FileReference, ParsedManifest, ParsedModpackData, SourceFormat};

/// Subfolders of the overrides root probed for a missing file.
pub const OVERRIDE_SUBDIRS: [&str; 2] = ["mods", "resourcepacks"];

/// Outcome of one validation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub manifest: ParsedModpackData,
    /// Always a subset of `manifest.file_references`.
    pub unresolved_files: Vec<FileReference>,
    pub overrides_present: BTreeSet<String>,
    pub source_format: SourceFormat,
    pub overrides_root: String,
}

impl ValidationResult {
    /// Unresolved files not covered by the archive's overrides.
    pub fn effective_unresolved(&self) -> impl Iterator<Item = &FileReference> {
        self.unresolved_files
            .iter()
            .filter(|f| !self.overrides_present.contains(&f.file_name))
    }

    pub fn needs_remediation(&self) -> bool {
        self.effective_unresolved().next().is_some()
    }
}

/// Candidate override locations for `file_name`.
pub fn override_paths(overrides_root: &str, file_name: &str) -> [String; 2] {
    OVERRIDE_SUBDIRS.map(|dir| format!("{}/{}/{}", overrides_root, dir, file_name))
}

pub fn is_in_overrides(archive: &ModpackArchive, overrides_root: &str, file_name: &str) -> bool {
    override_paths(overrides_root, file_name)
        .iter()
        .any(|path| archive.contains(path))
}

/// Join manifest references with remote metadata and probe the overrides.
///
/// Missing or partial metadata never fails the run: a reference without a
/// matching entry keeps its placeholder and counts as unresolved.
pub fn evaluate(
    archive: &ModpackArchive,
    parsed: ParsedManifest,
    metadata: Option<&[RemoteFileMetadata]>,
) -> ValidationResult {
    let ParsedManifest {
        mut data,
        source_format,
        overrides_root,
    } = parsed;

    if source_format == SourceFormat::Modrinth {
        debug!("Modrinth index carries direct downloads, skipping resolvability");
        return ValidationResult {
            manifest: data,
            unresolved_files: Vec::new(),
            overrides_present: BTreeSet::new(),
            source_format,
            overrides_root,
        };
    }

    let entries = metadata.unwrap_or(&[]);
    let index = MetadataIndex::new(entries);
    if entries.len() != data.file_references.len() {
        warn!(
            "Metadata count mismatch: {} entries for {} manifest files",
            entries.len(),
            data.file_references.len()
        );
    }

    let mut uncovered = 0usize;
    let joined: Vec<FileReference> = data
        .file_references
        .iter()
        .map(|reference| match index.get(&reference.external_id) {
            Some(meta) => meta.apply_to(reference),
            None => {
                uncovered += 1;
                reference.clone()
            }
        })
        .collect();
    if uncovered > 0 {
        warn!("{} manifest files have no metadata entry", uncovered);
    }

    data.file_references = dedupe_by_file_name(joined);

    let unresolved_files: Vec<FileReference> = data
        .file_references
        .iter()
        .filter(|r| !r.has_download_url())
        .cloned()
        .collect();

    let overrides_present: BTreeSet<String> = unresolved_files
        .iter()
        .filter(|r| is_in_overrides(archive, &overrides_root, &r.file_name))
        .map(|r| r.file_name.clone())
        .collect();

    info!(
        "Resolvability: {} files, {} unresolved, {} found in {}/",
        data.file_references.len(),
        unresolved_files.len(),
        overrides_present.len(),
        overrides_root
    );

    ValidationResult {
        manifest: data,
        unresolved_files,
        overrides_present,
        source_format,
        overrides_root,
    }
}
