use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::manifest::{ExternalId, FileReference, FileStatus};

/// Per-file download metadata fetched by the caller from the remote mod index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFileMetadata {
    pub external_id: ExternalId,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub download_url: Option<String>,
    /// Numeric status code as returned by the index.
    #[serde(default)]
    pub file_status: Option<u32>,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub source_slug: Option<String>,
    #[serde(default)]
    pub source_website_url: Option<String>,
}

/// Lookup by external id. The first entry for an id wins.
#[derive(Debug, Default)]
pub struct MetadataIndex<'a> {
    by_id: HashMap<ExternalId, &'a RemoteFileMetadata>,
}

impl<'a> MetadataIndex<'a> {
    pub fn new(entries: &'a [RemoteFileMetadata]) -> Self {
        let mut by_id = HashMap::with_capacity(entries.len());
        for entry in entries {
            by_id.entry(entry.external_id).or_insert(entry);
        }
        Self { by_id }
    }

    pub fn get(&self, id: &ExternalId) -> Option<&'a RemoteFileMetadata> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl RemoteFileMetadata {
    /// Fill a manifest reference with what the index knows about it.
    ///
    /// Blank names keep the reference's placeholder so it stays addressable.
    pub fn apply_to(&self, reference: &FileReference) -> FileReference {
        let file_name = non_blank(&self.file_name).unwrap_or(&reference.file_name);
        let display_name = non_blank(&self.display_name).unwrap_or(file_name);

        FileReference {
            external_id: reference.external_id,
            file_name: file_name.to_string(),
            display_name: display_name.to_string(),
            download_url: self
                .download_url
                .as_deref()
                .and_then(non_blank)
                .map(str::to_string),
            file_status: self
                .file_status
                .map(FileStatus::from_code)
                .unwrap_or(FileStatus::Unknown),
            is_available: self.is_available,
            required: reference.required,
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(project: u64, file: u64, name: &str, url: Option<&str>) -> RemoteFileMetadata {
        RemoteFileMetadata {
            external_id: ExternalId::new(project, file),
            file_name: name.into(),
            download_url: url.map(str::to_string),
            file_status: Some(4),
            is_available: url.is_some(),
            display_name: String::new(),
            source_slug: None,
            source_website_url: None,
        }
    }

    #[test]
    fn first_entry_per_id_wins() {
        let entries = vec![
            meta(1, 2, "first.jar", None),
            meta(1, 2, "second.jar", Some("https://x/second.jar")),
        ];
        let index = MetadataIndex::new(&entries);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&ExternalId::new(1, 2)).unwrap().file_name, "first.jar");
    }

    #[test]
    fn apply_keeps_placeholder_for_blank_names() {
        let reference = FileReference::unresolved(ExternalId::new(7, 8), false);
        let applied = meta(7, 8, "  ", Some(" ")).apply_to(&reference);

        assert_eq!(applied.file_name, "project-7-file-8");
        assert_eq!(applied.display_name, "project-7-file-8");
        assert_eq!(applied.download_url, None);
        assert_eq!(applied.file_status, FileStatus::Approved);
        assert!(!applied.required);
    }

    #[test]
    fn deserializes_camel_case_payload() {
        let parsed: RemoteFileMetadata = serde_json::from_value(serde_json::json!({
            "externalId": { "projectId": 238222, "fileId": 4712866 },
            "fileName": "jei-1.20.1-forge-15.2.0.27.jar",
            "downloadUrl": "",
            "fileStatus": 4,
            "isAvailable": false,
            "displayName": "JEI",
            "sourceSlug": "jei"
        }))
        .unwrap();

        assert_eq!(parsed.external_id, ExternalId::new(238222, 4712866));
        assert_eq!(parsed.download_url.as_deref(), Some(""));
        assert_eq!(parsed.source_website_url, None);
    }
}
