// ─── CurseForge manifest.json ───
// Loader list with a `primary` flag, files identified by project/file ids.

use serde::Deserialize;
use tracing::debug;

use super::model::{
    dedupe_by_file_name, ExternalId, FileReference, ModLoader, ParsedManifest, ParsedModpackData,
    SourceFormat,
};
use crate::core::error::{ValidatorError, ValidatorResult};

pub const DEFAULT_OVERRIDES_ROOT: &str = "overrides";

/// Subset of CurseForge's `manifest.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurseForgeManifest {
    pub minecraft: CurseForgeMinecraft,
    #[serde(default)]
    pub manifest_type: Option<String>,
    #[serde(default)]
    pub manifest_version: Option<u32>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub files: Vec<CurseForgeFile>,
    #[serde(default)]
    pub overrides: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurseForgeMinecraft {
    pub version: String,
    #[serde(default)]
    pub mod_loaders: Vec<CurseForgeModLoader>,
    #[serde(default)]
    pub recommended_ram: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurseForgeModLoader {
    pub id: String,
    #[serde(default)]
    pub primary: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurseForgeFile {
    #[serde(rename = "projectID")]
    pub project_id: u64,
    #[serde(rename = "fileID")]
    pub file_id: u64,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl CurseForgeManifest {
    pub fn from_json(raw: &str) -> ValidatorResult<Self> {
        serde_json::from_str(raw).map_err(|e| ValidatorError::MalformedManifest {
            path: "manifest.json".into(),
            reason: e.to_string(),
        })
    }

    /// Loader entry flagged `primary`.
    pub fn primary_loader(&self) -> Option<&CurseForgeModLoader> {
        self.minecraft.mod_loaders.iter().find(|l| l.primary)
    }

    /// External ids in manifest order, duplicates removed.
    pub fn external_ids(&self) -> Vec<ExternalId> {
        let mut ids: Vec<ExternalId> = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let id = ExternalId::new(file.project_id, file.file_id);
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn overrides_root(&self) -> String {
        self.overrides
            .as_deref()
            .map(|o| o.trim_matches('/'))
            .filter(|o| !o.is_empty())
            .unwrap_or(DEFAULT_OVERRIDES_ROOT)
            .to_string()
    }

    /// Normalize into the canonical model.
    pub fn into_parsed(self) -> ValidatorResult<ParsedManifest> {
        let primary = self.primary_loader().ok_or_else(|| {
            ValidatorError::InvalidModloaderFormat("no modloader is flagged primary".into())
        })?;
        let (modloader, modloader_version) = parse_modloader_id(&primary.id)?;

        let references: Vec<FileReference> = self
            .files
            .iter()
            .map(|f| FileReference::unresolved(ExternalId::new(f.project_id, f.file_id), f.required))
            .collect();
        let file_references = dedupe_by_file_name(references);
        let overrides_root = self.overrides_root();

        debug!(
            "CurseForge manifest '{}': {} {} on MC {}, {} files",
            self.name,
            modloader,
            modloader_version,
            self.minecraft.version,
            file_references.len()
        );

        Ok(ParsedManifest {
            data: ParsedModpackData {
                name: self.name,
                version: self.version,
                author: self.author,
                minecraft_version: self.minecraft.version,
                modloader,
                modloader_version,
                recommended_ram_mb: self.minecraft.recommended_ram,
                file_references,
            },
            source_format: SourceFormat::CurseForge,
            overrides_root,
        })
    }
}

/// Split a loader id such as `forge-47.2.0` or `neoforge-20.4.237`.
///
/// The loader name ends at the first `-`; everything after it is the version.
pub fn parse_modloader_id(id: &str) -> ValidatorResult<(ModLoader, String)> {
    let (name, version) = id
        .split_once('-')
        .ok_or_else(|| ValidatorError::InvalidModloaderFormat(id.to_string()))?;

    if version.is_empty() {
        return Err(ValidatorError::InvalidModloaderFormat(id.to_string()));
    }

    let loader = ModLoader::from_name(name)
        .ok_or_else(|| ValidatorError::InvalidModloaderFormat(id.to_string()))?;

    Ok((loader, version.to_string()))
}
