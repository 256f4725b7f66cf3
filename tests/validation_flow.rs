use std::io::{Cursor, Write};

use modpack_gate_lib::core::config::ValidatorSettings;
use modpack_gate_lib::core::context::ValidationContext;
use modpack_gate_lib::core::error::FailureKind;
use modpack_gate_lib::core::manifest::{ExternalId, ModLoader, SourceFormat};
use modpack_gate_lib::core::resolver::RemoteFileMetadata;
use modpack_gate_lib::core::session::{ModpackSelection, SessionState, ValidationOrchestrator};
use modpack_gate_lib::core::worker::{self, WorkerMode, WorkerOutput, WorkerRequest};
use zip::write::SimpleFileOptions;

fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn curseforge_manifest(loader_id: &str) -> String {
    serde_json::json!({
        "minecraft": {
            "version": "1.20.1",
            "modLoaders": [{ "id": loader_id, "primary": true }]
        },
        "manifestType": "minecraftModpack",
        "manifestVersion": 1,
        "name": "All The Tests",
        "version": "1.0.0",
        "author": "tester",
        "files": [{ "projectID": 238222, "fileID": 4712866, "required": true }],
        "overrides": "overrides"
    })
    .to_string()
}

fn missing_download() -> Vec<RemoteFileMetadata> {
    vec![RemoteFileMetadata {
        external_id: ExternalId::new(238222, 4712866),
        file_name: "jei-1.20.1-forge-15.2.0.27.jar".into(),
        download_url: None,
        file_status: Some(4),
        is_available: false,
        display_name: "Just Enough Items".into(),
        source_slug: Some("jei".into()),
        source_website_url: None,
    }]
}

fn orchestrator() -> ValidationOrchestrator {
    ValidationOrchestrator::new(ValidationContext::new(ValidatorSettings::default()))
}

#[tokio::test]
async fn override_entry_auto_resolves_missing_download() {
    let manifest = curseforge_manifest("forge-47.2.0");
    let archive = zip_bytes(&[
        ("manifest.json", manifest.as_str()),
        ("overrides/mods/jei-1.20.1-forge-15.2.0.27.jar", "jar"),
    ]);

    let mut orch = orchestrator();
    orch.select_file(ModpackSelection::new("pack.zip", archive).with_metadata(missing_download()));
    assert_eq!(orch.next_response().await, &SessionState::Parsed);

    let result = orch.validation_result().unwrap();
    assert_eq!(result.manifest.modloader, ModLoader::Forge);
    assert_eq!(result.manifest.modloader_version, "47.2.0");
    assert_eq!(result.manifest.minecraft_version, "1.20.1");
    assert_eq!(result.unresolved_files.len(), 1);
    assert!(result
        .overrides_present
        .contains("jei-1.20.1-forge-15.2.0.27.jar"));
    assert!(orch.can_continue());

    let payload = orch.continue_session().unwrap();
    assert!(payload.upload_map.is_empty());
    assert!(!payload.needs_rebuild());
    assert_eq!(orch.state(), &SessionState::Resolved);
}

#[tokio::test]
async fn missing_file_blocks_until_exact_name_uploaded() {
    let manifest = curseforge_manifest("forge-47.2.0");
    let archive = zip_bytes(&[("manifest.json", manifest.as_str())]);

    let mut orch = orchestrator();
    orch.select_file(ModpackSelection::new("pack.zip", archive).with_metadata(missing_download()));
    assert_eq!(orch.next_response().await, &SessionState::ParsedWithIssues);
    assert_eq!(orch.still_missing().len(), 1);
    assert!(orch.continue_session().is_err());

    orch.begin_remediation().unwrap();
    assert!(orch.upload_file("jei.jar", b"jar".to_vec()).is_err());
    assert!(orch.continue_session().is_err());

    orch.upload_file("jei-1.20.1-forge-15.2.0.27.jar", b"jar".to_vec())
        .unwrap();
    let payload = orch.continue_session().unwrap();

    let rebuild = payload.clone().into_rebuild_request();
    assert_eq!(
        rebuild.injection_path("jei-1.20.1-forge-15.2.0.27.jar"),
        "overrides/mods/jei-1.20.1-forge-15.2.0.27.jar"
    );
    assert_eq!(payload.upload_map.len(), 1);
    assert_eq!(payload.source_format, SourceFormat::CurseForge);
}

#[tokio::test]
async fn modrinth_with_wrong_game_fails() {
    let index = serde_json::json!({
        "formatVersion": 1,
        "game": "modpack",
        "versionId": "1.0",
        "name": "Wrong Game",
        "files": [],
        "dependencies": { "minecraft": "1.20.1", "fabric-loader": "0.15.0" }
    })
    .to_string();
    let archive = zip_bytes(&[("modrinth.index.json", index.as_str())]);

    let mut orch = orchestrator();
    orch.select_file(ModpackSelection::new("pack.mrpack", archive));
    assert!(matches!(
        orch.next_response().await,
        SessionState::Failed(f) if f.kind == FailureKind::UnsupportedGame
    ));
}

#[tokio::test]
async fn loader_id_without_separator_fails() {
    let manifest = curseforge_manifest("forge47.2.0");
    let archive = zip_bytes(&[("manifest.json", manifest.as_str())]);

    let mut orch = orchestrator();
    orch.select_file(ModpackSelection::new("pack.zip", archive));
    assert!(matches!(
        orch.next_response().await,
        SessionState::Failed(f) if f.kind == FailureKind::InvalidModloaderFormat
    ));
}

#[tokio::test]
async fn modrinth_pack_never_has_unresolved_files() {
    let index = serde_json::json!({
        "formatVersion": 1,
        "game": "minecraft",
        "versionId": "5.1.0",
        "name": "Fabulously Optimized",
        "files": [{ "path": "mods/sodium.jar", "downloads": ["https://cdn.modrinth.com/sodium.jar"], "fileSize": 10 }],
        "dependencies": { "minecraft": "1.20.4", "fabric-loader": "0.15.3" }
    })
    .to_string();
    let archive = zip_bytes(&[("modrinth.index.json", index.as_str())]);

    let mut orch = orchestrator();
    orch.select_file(ModpackSelection::new("fo.mrpack", archive));
    assert_eq!(orch.next_response().await, &SessionState::Parsed);

    let result = orch.validation_result().unwrap();
    assert_eq!(result.source_format, SourceFormat::Modrinth);
    assert_eq!(result.manifest.modloader, ModLoader::Fabric);
    assert!(result.unresolved_files.is_empty());
}

#[tokio::test]
async fn reselecting_abandons_previous_session() {
    let manifest = curseforge_manifest("forge-47.2.0");
    let first = zip_bytes(&[("manifest.json", manifest.as_str())]);
    let second = zip_bytes(&[("readme.txt", "no manifest here")]);

    let mut orch = orchestrator();
    let old = orch.select_file(ModpackSelection::new("first.zip", first));
    let current = orch.select_file(ModpackSelection::new("second.zip", second));
    assert!(current > old);

    // Both workers reply; only the second one may land.
    assert!(matches!(
        orch.next_response().await,
        SessionState::Failed(f) if f.kind == FailureKind::NoManifestFound
    ));
    assert_eq!(orch.current_token(), Some(current));
}

#[tokio::test]
async fn identical_bytes_parse_identically() {
    let manifest = curseforge_manifest("neoforge-20.4.237");
    let archive = zip_bytes(&[("manifest.json", manifest.as_str())]);

    let a = worker::run_isolated(WorkerRequest::new(archive.clone(), WorkerMode::ExtractManifestOnly)).await;
    let b = worker::run_isolated(WorkerRequest::new(archive, WorkerMode::ExtractManifestOnly)).await;

    let (a, b) = match (a.unwrap(), b.unwrap()) {
        (WorkerOutput::Manifest(a), WorkerOutput::Manifest(b)) => (a, b),
        other => panic!("unexpected outputs: {:?}", other),
    };
    assert_eq!(
        serde_json::to_vec(&a.data).unwrap(),
        serde_json::to_vec(&b.data).unwrap()
    );
    assert_eq!(a.data.modloader, ModLoader::NeoForge);
}
