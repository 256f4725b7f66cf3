use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::curseforge::CurseForgeManifest;
use super::modrinth::ModrinthIndex;

/// Supported mod loaders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModLoader {
    Forge,
    NeoForge,
    Fabric,
    Quilt,
}

impl ModLoader {
    /// Loader name as it appears in a CurseForge modloader id (`forge-47.2.0`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "forge" => Some(ModLoader::Forge),
            "neoforge" => Some(ModLoader::NeoForge),
            "fabric" => Some(ModLoader::Fabric),
            "quilt" => Some(ModLoader::Quilt),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModLoader::Forge => write!(f, "forge"),
            ModLoader::NeoForge => write!(f, "neoforge"),
            ModLoader::Fabric => write!(f, "fabric"),
            ModLoader::Quilt => write!(f, "quilt"),
        }
    }
}

/// Which descriptor the archive carried.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// `manifest.json`
    CurseForge,
    /// `modrinth.index.json`
    Modrinth,
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::CurseForge => write!(f, "curseforge"),
            SourceFormat::Modrinth => write!(f, "modrinth"),
        }
    }
}

/// The `(projectID, fileID)` pair identifying a file on the remote index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct ExternalId {
    pub project_id: u64,
    pub file_id: u64,
}

impl ExternalId {
    pub fn new(project_id: u64, file_id: u64) -> Self {
        Self {
            project_id,
            file_id,
        }
    }

    /// Stand-in file name used until remote metadata supplies the real one.
    pub fn placeholder_file_name(&self) -> String {
        format!("project-{}-file-{}", self.project_id, self.file_id)
    }
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.project_id, self.file_id)
    }
}

/// Remote file status, mirroring the numeric codes of the mod index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FileStatus {
    Processing,
    ChangesRequired,
    UnderReview,
    Approved,
    Rejected,
    MalwareDetected,
    Deleted,
    Archived,
    Testing,
    Released,
    ReadyForReview,
    Deprecated,
    Baking,
    AwaitingPublishing,
    FailedPublishing,
    /// No metadata entry, or a code we don't know.
    Unknown,
}

impl FileStatus {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => FileStatus::Processing,
            2 => FileStatus::ChangesRequired,
            3 => FileStatus::UnderReview,
            4 => FileStatus::Approved,
            5 => FileStatus::Rejected,
            6 => FileStatus::MalwareDetected,
            7 => FileStatus::Deleted,
            8 => FileStatus::Archived,
            9 => FileStatus::Testing,
            10 => FileStatus::Released,
            11 => FileStatus::ReadyForReview,
            12 => FileStatus::Deprecated,
            13 => FileStatus::Baking,
            14 => FileStatus::AwaitingPublishing,
            15 => FileStatus::FailedPublishing,
            _ => FileStatus::Unknown,
        }
    }
}

/// One content file referenced by the manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    pub external_id: ExternalId,
    pub file_name: String,
    pub display_name: String,
    pub download_url: Option<String>,
    pub file_status: FileStatus,
    pub is_available: bool,
    /// Carried from the manifest; resolvability does not look at it.
    pub required: bool,
}

impl FileReference {
    /// Reference built from the manifest alone, before any metadata join.
    pub fn unresolved(external_id: ExternalId, required: bool) -> Self {
        let name = external_id.placeholder_file_name();
        Self {
            external_id,
            file_name: name.clone(),
            display_name: name,
            download_url: None,
            file_status: FileStatus::Unknown,
            is_available: false,
            required,
        }
    }

    /// True when the installer can fetch this file on its own.
    pub fn has_download_url(&self) -> bool {
        self.download_url
            .as_deref()
            .map(|url| !url.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Canonical modpack description, identical in shape for both formats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedModpackData {
    pub name: String,
    pub version: String,
    pub author: String,
    pub minecraft_version: String,
    pub modloader: ModLoader,
    pub modloader_version: String,
    #[serde(rename = "recommendedRamMB")]
    pub recommended_ram_mb: Option<u32>,
    pub file_references: Vec<FileReference>,
}

/// Parser output: canonical data plus what downstream steps need to know
/// about the archive layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedManifest {
    pub data: ParsedModpackData,
    pub source_format: SourceFormat,
    /// Escape-hatch folder inside the archive (normally `overrides`).
    pub overrides_root: String,
}

/// Raw descriptor, exactly one variant per archive.
#[derive(Debug, Clone)]
pub enum ManifestDescriptor {
    CurseForge(CurseForgeManifest),
    Modrinth(ModrinthIndex),
}

impl ManifestDescriptor {
    pub fn source_format(&self) -> SourceFormat {
        match self {
            ManifestDescriptor::CurseForge(_) => SourceFormat::CurseForge,
            ManifestDescriptor::Modrinth(_) => SourceFormat::Modrinth,
        }
    }
}

/// Drop references whose file name was already seen; first one wins.
pub fn dedupe_by_file_name(references: Vec<FileReference>) -> Vec<FileReference> {
    let mut seen = HashSet::new();
    references
        .into_iter()
        .filter(|r| seen.insert(r.file_name.clone()))
        .collect()
}
