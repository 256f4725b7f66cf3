// ─── Modrinth modrinth.index.json ───
// Every file already carries its own download URLs, so nothing here needs
// remote metadata.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use super::curseforge::DEFAULT_OVERRIDES_ROOT;
use super::model::{ModLoader, ParsedManifest, ParsedModpackData, SourceFormat};
use crate::core::error::{ValidatorError, ValidatorResult};

const SUPPORTED_GAME: &str = "minecraft";
const MINECRAFT_DEPENDENCY: &str = "minecraft";

/// Loader dependency keys, probed in this order; first match wins.
const LOADER_KEYS: [(&str, ModLoader); 4] = [
    ("forge", ModLoader::Forge),
    ("neoforge", ModLoader::NeoForge),
    ("fabric-loader", ModLoader::Fabric),
    ("quilt-loader", ModLoader::Quilt),
];

/// Subset of Modrinth's `modrinth.index.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModrinthIndex {
    #[serde(default)]
    pub format_version: Option<u32>,
    #[serde(default)]
    pub game: String,
    #[serde(default)]
    pub version_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub files: Vec<ModrinthFile>,
    #[serde(default)]
    pub dependencies: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModrinthFile {
    pub path: String,
    #[serde(default)]
    pub downloads: Vec<String>,
    #[serde(default)]
    pub file_size: u64,
}

impl ModrinthIndex {
    pub fn from_json(raw: &str) -> ValidatorResult<Self> {
        serde_json::from_str(raw).map_err(|e| ValidatorError::MalformedManifest {
            path: "modrinth.index.json".into(),
            reason: e.to_string(),
        })
    }

    /// First known loader dependency, in fixed priority order.
    pub fn modloader(&self) -> Option<(ModLoader, &str)> {
        LOADER_KEYS.iter().find_map(|(key, loader)| {
            self.dependencies
                .get(*key)
                .map(|version| (*loader, version.as_str()))
        })
    }

    /// Normalize into the canonical model. `file_references` stays empty.
    pub fn into_parsed(self) -> ValidatorResult<ParsedManifest> {
        if self.game != SUPPORTED_GAME {
            return Err(ValidatorError::UnsupportedGame(self.game));
        }

        let minecraft_version = self
            .dependencies
            .get(MINECRAFT_DEPENDENCY)
            .cloned()
            .ok_or_else(|| ValidatorError::MalformedManifest {
                path: "modrinth.index.json".into(),
                reason: "dependencies.minecraft is missing".into(),
            })?;

        let (modloader, modloader_version) = self
            .modloader()
            .map(|(loader, version)| (loader, version.to_string()))
            .ok_or(ValidatorError::NoModloaderFound)?;

        debug!(
            "Modrinth index '{}': {} {} on MC {}, {} files with direct downloads",
            self.name,
            modloader,
            modloader_version,
            minecraft_version,
            self.files.len()
        );

        Ok(ParsedManifest {
            data: ParsedModpackData {
                name: self.name,
                version: self.version_id,
                author: String::new(),
                minecraft_version,
                modloader,
                modloader_version,
                recommended_ram_mb: None,
                file_references: Vec::new(),
            },
            source_format: SourceFormat::Modrinth,
            overrides_root: DEFAULT_OVERRIDES_ROOT.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(game: &str, deps: serde_json::Value) -> ModrinthIndex {
        serde_json::from_value(serde_json::json!({
            "formatVersion": 1,
            "game": game,
            "versionId": "3.0.0",
            "name": "Fabulously Optimized",
            "files": [{
                "path": "mods/sodium.jar",
                "hashes": { "sha1": "abc" },
                "downloads": ["https://cdn.modrinth.com/data/x/sodium.jar"],
                "fileSize": 1024
            }],
            "dependencies": deps
        }))
        .unwrap()
    }

    #[test]
    fn non_minecraft_game_is_rejected() {
        let idx = index("modpack", serde_json::json!({ "minecraft": "1.20.1" }));
        assert!(matches!(
            idx.into_parsed(),
            Err(ValidatorError::UnsupportedGame(game)) if game == "modpack"
        ));
    }

    #[test]
    fn loader_priority_prefers_forge_family() {
        let idx = index(
            "minecraft",
            serde_json::json!({
                "minecraft": "1.20.1",
                "fabric-loader": "0.15.0",
                "neoforge": "47.1.0"
            }),
        );
        let parsed = idx.into_parsed().unwrap();
        assert_eq!(parsed.data.modloader, ModLoader::NeoForge);
        assert_eq!(parsed.data.modloader_version, "47.1.0");
    }

    #[test]
    fn quilt_is_found_last() {
        let idx = index(
            "minecraft",
            serde_json::json!({ "minecraft": "1.20.4", "quilt-loader": "0.23.1" }),
        );
        let parsed = idx.into_parsed().unwrap();
        assert_eq!(parsed.data.modloader, ModLoader::Quilt);
        assert_eq!(parsed.data.version, "3.0.0");
        assert!(parsed.data.file_references.is_empty());
    }

    #[test]
    fn no_known_loader_fails() {
        let idx = index(
            "minecraft",
            serde_json::json!({ "minecraft": "1.20.1", "liteloader": "1.0" }),
        );
        assert!(matches!(
            idx.into_parsed(),
            Err(ValidatorError::NoModloaderFound)
        ));
    }

    #[test]
    fn missing_minecraft_dependency_is_malformed() {
        let idx = index("minecraft", serde_json::json!({ "forge": "47.2.0" }));
        assert!(matches!(
            idx.into_parsed(),
            Err(ValidatorError::MalformedManifest { .. })
        ));
    }
}
