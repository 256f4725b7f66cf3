// ─── Format Detection ───
// CurseForge's `manifest.json` is probed before `modrinth.index.json`.

use tracing::info;

use super::curseforge::CurseForgeManifest;
use super::model::{ManifestDescriptor, ParsedManifest, SourceFormat};
use super::modrinth::ModrinthIndex;
use crate::core::archive::ModpackArchive;
use crate::core::error::{ValidatorError, ValidatorResult};

pub const CURSEFORGE_MANIFEST: &str = "manifest.json";
pub const MODRINTH_INDEX: &str = "modrinth.index.json";

/// Identify which descriptor the archive carries.
pub fn detect_format(archive: &ModpackArchive) -> ValidatorResult<SourceFormat> {
    if archive.contains(CURSEFORGE_MANIFEST) {
        Ok(SourceFormat::CurseForge)
    } else if archive.contains(MODRINTH_INDEX) {
        Ok(SourceFormat::Modrinth)
    } else {
        Err(ValidatorError::NoManifestFound)
    }
}

/// Read and deserialize the descriptor for the detected format.
pub fn read_descriptor(archive: &ModpackArchive) -> ValidatorResult<ManifestDescriptor> {
    match detect_format(archive)? {
        SourceFormat::CurseForge => {
            let raw = archive.read_entry_string(CURSEFORGE_MANIFEST)?;
            Ok(ManifestDescriptor::CurseForge(CurseForgeManifest::from_json(
                &raw,
            )?))
        }
        SourceFormat::Modrinth => {
            let raw = archive.read_entry_string(MODRINTH_INDEX)?;
            Ok(ManifestDescriptor::Modrinth(ModrinthIndex::from_json(&raw)?))
        }
    }
}

impl ManifestDescriptor {
    /// Consume the raw descriptor into the canonical model.
    pub fn into_parsed(self) -> ValidatorResult<ParsedManifest> {
        match self {
            ManifestDescriptor::CurseForge(manifest) => manifest.into_parsed(),
            ManifestDescriptor::Modrinth(index) => index.into_parsed(),
        }
    }
}

/// Detect, read and normalize in one step.
pub fn parse_manifest(archive: &ModpackArchive) -> ValidatorResult<ParsedManifest> {
    let descriptor = read_descriptor(archive)?;
    let parsed = descriptor.into_parsed()?;
    info!(
        "Parsed {} modpack '{}' {} ({} {}, MC {})",
        parsed.source_format,
        parsed.data.name,
        parsed.data.version,
        parsed.data.modloader,
        parsed.data.modloader_version,
        parsed.data.minecraft_version
    );
    Ok(parsed)
}
