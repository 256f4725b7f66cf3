// ─── Archive Rebuilder Seam ───
// A resolved session may carry manual uploads that have to be injected into
// the archive before import. Rewriting the archive is the importer's job;
// this module only defines what it is handed.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::core::error::ValidatorResult;
use crate::core::resolver::UploadedFile;

#[derive(Debug, Clone)]
pub struct RebuildRequest {
    pub archive_bytes: Vec<u8>,
    pub overrides_root: String,
    pub upload_map: BTreeMap<String, UploadedFile>,
}

impl RebuildRequest {
    /// Where an uploaded file belongs inside the archive.
    ///
    /// `.jar` goes to `mods/`, anything else (`.zip`) to `resourcepacks/`.
    pub fn injection_path(&self, file_name: &str) -> String {
        let folder = if file_name.to_ascii_lowercase().ends_with(".jar") {
            "mods"
        } else {
            "resourcepacks"
        };
        format!("{}/{}/{}", self.overrides_root, folder, file_name)
    }

    /// `(archive path, upload)` pairs in file-name order.
    pub fn injections(&self) -> impl Iterator<Item = (String, &UploadedFile)> {
        self.upload_map
            .iter()
            .map(|(name, file)| (self.injection_path(name), file))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildProgress {
    pub stage: String,
    pub current: u64,
    pub total: u64,
}

#[async_trait]
pub trait ArchiveRebuilder: Send + Sync {
    /// Produce a new archive with every upload injected.
    async fn rebuild(
        &self,
        request: RebuildRequest,
        progress: mpsc::UnboundedSender<RebuildProgress>,
    ) -> ValidatorResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(names: &[&str]) -> RebuildRequest {
        RebuildRequest {
            archive_bytes: b"PK".to_vec(),
            overrides_root: "overrides".into(),
            upload_map: names
                .iter()
                .map(|n| (n.to_string(), UploadedFile::new(n.as_bytes().to_vec())))
                .collect(),
        }
    }

    #[test]
    fn jars_go_to_mods_and_zips_to_resourcepacks() {
        let req = request(&[]);
        assert_eq!(req.injection_path("jei.jar"), "overrides/mods/jei.jar");
        assert_eq!(req.injection_path("Faithful.ZIP"), "overrides/resourcepacks/Faithful.ZIP");
        assert_eq!(req.injection_path("Sodium.JAR"), "overrides/mods/Sodium.JAR");
    }

    struct CountingRebuilder;

    #[async_trait]
    impl ArchiveRebuilder for CountingRebuilder {
        async fn rebuild(
            &self,
            request: RebuildRequest,
            progress: mpsc::UnboundedSender<RebuildProgress>,
        ) -> ValidatorResult<Vec<u8>> {
            let total = request.upload_map.len() as u64;
            let mut out = request.archive_bytes.clone();
            for (i, (path, _)) in request.injections().enumerate() {
                let _ = progress.send(RebuildProgress {
                    stage: "inject".into(),
                    current: i as u64 + 1,
                    total,
                });
                out.extend_from_slice(path.as_bytes());
            }
            Ok(out)
        }
    }

    #[tokio::test]
    async fn rebuilder_reports_progress_per_upload() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let out = CountingRebuilder
            .rebuild(request(&["a.jar", "b.zip"]), tx)
            .await
            .unwrap();

        assert!(out.starts_with(b"PK"));
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!((first.current, first.total), (1, 2));
        assert_eq!((second.current, second.total), (2, 2));
        assert!(rx.recv().await.is_none());
    }
}
