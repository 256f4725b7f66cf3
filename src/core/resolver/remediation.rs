// ─── Remediation ───
// What is still missing, and whether the caller may continue, given the
// files the user has uploaded so far.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use sha1::{Digest, Sha1};

use super::evaluator::ValidationResult;
use crate::core::error::{ValidatorError, ValidatorResult};
use crate::core::manifest::FileReference;

/// A user-supplied replacement for an unresolved file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub size: u64,
    pub sha1: String,
}

impl UploadedFile {
    pub fn new(bytes: Vec<u8>) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(&bytes);
        let sha1 = hex::encode(hasher.finalize());
        Self {
            size: bytes.len() as u64,
            bytes,
            sha1,
        }
    }
}

/// Per-file remediation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemediationEntry {
    MissingFromOverrides,
    PresentInOverrides,
    /// Never holds an empty buffer.
    ManuallyUploaded(UploadedFile),
}

impl RemediationEntry {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, RemediationEntry::MissingFromOverrides)
    }
}

impl Serialize for RemediationEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let tag = match self {
            RemediationEntry::MissingFromOverrides => "missingFromOverrides",
            RemediationEntry::PresentInOverrides => "presentInOverrides",
            RemediationEntry::ManuallyUploaded(_) => "manuallyUploaded",
        };
        serializer.serialize_str(tag)
    }
}

/// `file_name → status` for every unresolved file of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemediationState {
    entries: BTreeMap<String, RemediationEntry>,
}

impl RemediationState {
    /// Initial state: each unresolved file is either already in the
    /// overrides or missing.
    pub fn from_result(result: &ValidationResult) -> Self {
        let entries = result
            .unresolved_files
            .iter()
            .map(|file| {
                let entry = if result.overrides_present.contains(&file.file_name) {
                    RemediationEntry::PresentInOverrides
                } else {
                    RemediationEntry::MissingFromOverrides
                };
                (file.file_name.clone(), entry)
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, file_name: &str) -> Option<&RemediationEntry> {
        self.entries.get(file_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RemediationEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a manual upload for `file_name`.
    ///
    /// Rejections leave the state untouched.
    pub fn upload(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
        accepted_extensions: &[String],
    ) -> ValidatorResult<()> {
        if bytes.is_empty() {
            return Err(ValidatorError::EmptyUpload(file_name.to_string()));
        }
        if !is_accepted_upload(file_name, accepted_extensions) {
            return Err(ValidatorError::UnsupportedUploadType(file_name.to_string()));
        }
        match self.entries.get_mut(file_name) {
            None => Err(ValidatorError::UnknownUpload(file_name.to_string())),
            Some(RemediationEntry::PresentInOverrides) => {
                Err(ValidatorError::AlreadyInOverrides(file_name.to_string()))
            }
            Some(entry) => {
                *entry = RemediationEntry::ManuallyUploaded(UploadedFile::new(bytes));
                Ok(())
            }
        }
    }

    /// Undo an upload. Returns whether anything changed.
    pub fn remove_upload(&mut self, file_name: &str) -> bool {
        match self.entries.get_mut(file_name) {
            Some(entry) if matches!(entry, RemediationEntry::ManuallyUploaded(_)) => {
                *entry = RemediationEntry::MissingFromOverrides;
                true
            }
            _ => false,
        }
    }

    /// Uploaded files keyed by file name, ready for the archive rebuilder.
    pub fn upload_map(&self) -> BTreeMap<String, UploadedFile> {
        self.entries
            .iter()
            .filter_map(|(name, entry)| match entry {
                RemediationEntry::ManuallyUploaded(file) => Some((name.clone(), file.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn into_upload_map(self) -> BTreeMap<String, UploadedFile> {
        self.entries
            .into_iter()
            .filter_map(|(name, entry)| match entry {
                RemediationEntry::ManuallyUploaded(file) => Some((name, file)),
                _ => None,
            })
            .collect()
    }
}

/// Unresolved files not covered by the overrides or an upload.
pub fn still_missing<'a>(
    result: &'a ValidationResult,
    state: &RemediationState,
) -> Vec<&'a FileReference> {
    result
        .unresolved_files
        .iter()
        .filter(|file| match state.get(&file.file_name) {
            Some(entry) => !entry.is_resolved(),
            None => !result.overrides_present.contains(&file.file_name),
        })
        .collect()
}

pub fn can_continue(result: &ValidationResult, state: &RemediationState) -> bool {
    result.unresolved_files.is_empty() || still_missing(result, state).is_empty()
}

/// Upload names must end in one of the accepted content-file extensions.
pub fn is_accepted_upload(file_name: &str, accepted_extensions: &[String]) -> bool {
    let lower = file_name.to_ascii_lowercase();
    accepted_extensions.iter().any(|ext| {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        lower.len() > ext.len() + 1 && lower.ends_with(&format!(".{}", ext))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::{ExternalId, ModLoader, ParsedModpackData, SourceFormat};
    use std::collections::BTreeSet;

    fn exts() -> Vec<String> {
        vec![".jar".into(), ".zip".into()]
    }

    fn reference(project: u64, name: &str) -> FileReference {
        let mut r = FileReference::unresolved(ExternalId::new(project, project * 10), true);
        r.file_name = name.into();
        r
    }

    fn result(unresolved: &[&str], in_overrides: &[&str]) -> ValidationResult {
        let refs: Vec<FileReference> = unresolved
            .iter()
            .enumerate()
            .map(|(i, n)| reference(i as u64 + 1, n))
            .collect();
        ValidationResult {
            manifest: ParsedModpackData {
                name: "Pack".into(),
                version: "1.0".into(),
                author: String::new(),
                minecraft_version: "1.20.1".into(),
                modloader: ModLoader::Forge,
                modloader_version: "47.2.0".into(),
                recommended_ram_mb: None,
                file_references: refs.clone(),
            },
            unresolved_files: refs,
            overrides_present: in_overrides.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            source_format: SourceFormat::CurseForge,
            overrides_root: "overrides".into(),
        }
    }

    #[test]
    fn initial_state_reflects_overrides() {
        let res = result(&["a.jar", "b.jar"], &["b.jar"]);
        let state = RemediationState::from_result(&res);

        assert_eq!(state.get("a.jar"), Some(&RemediationEntry::MissingFromOverrides));
        assert_eq!(state.get("b.jar"), Some(&RemediationEntry::PresentInOverrides));
        let missing: Vec<&str> = still_missing(&res, &state)
            .iter()
            .map(|f| f.file_name.as_str())
            .collect();
        assert_eq!(missing, vec!["a.jar"]);
        assert!(!can_continue(&res, &state));
    }

    #[test]
    fn upload_under_exact_name_unblocks_continue() {
        let res = result(&["a.jar"], &[]);
        let mut state = RemediationState::from_result(&res);

        assert!(matches!(
            state.upload("A-renamed.jar", b"jar".to_vec(), &exts()),
            Err(ValidatorError::UnknownUpload(_))
        ));
        assert!(!can_continue(&res, &state));

        state.upload("a.jar", b"jar".to_vec(), &exts()).unwrap();
        assert!(can_continue(&res, &state));
        assert_eq!(state.upload_map().len(), 1);
    }

    #[test]
    fn bad_uploads_are_rejected_without_change() {
        let res = result(&["a.jar", "b.jar"], &["b.jar"]);
        let mut state = RemediationState::from_result(&res);
        let before = state.clone();

        assert!(matches!(
            state.upload("a.jar", Vec::new(), &exts()),
            Err(ValidatorError::EmptyUpload(_))
        ));
        assert!(matches!(
            state.upload("a.txt", b"x".to_vec(), &exts()),
            Err(ValidatorError::UnsupportedUploadType(_))
        ));
        assert!(matches!(
            state.upload("b.jar", b"x".to_vec(), &exts()),
            Err(ValidatorError::AlreadyInOverrides(_))
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn removing_upload_reverts_to_missing() {
        let res = result(&["a.jar"], &[]);
        let mut state = RemediationState::from_result(&res);
        state.upload("a.jar", b"jar".to_vec(), &exts()).unwrap();

        assert!(state.remove_upload("a.jar"));
        assert_eq!(state.get("a.jar"), Some(&RemediationEntry::MissingFromOverrides));
        assert!(!state.remove_upload("a.jar"));
        assert!(!can_continue(&res, &state));
    }

    #[test]
    fn empty_unresolved_always_continues() {
        let res = result(&[], &[]);
        let state = RemediationState::from_result(&res);
        assert!(state.is_empty());
        assert!(can_continue(&res, &state));
    }

    #[test]
    fn placeholder_names_stay_blocked_but_keep_their_id() {
        let id = ExternalId::new(1, 10);
        let placeholder = id.placeholder_file_name();
        let res = result(&[placeholder.as_str()], &[]);
        let mut state = RemediationState::from_result(&res);

        assert!(matches!(
            state.upload(&placeholder, b"jar".to_vec(), &exts()),
            Err(ValidatorError::UnsupportedUploadType(_))
        ));
        let missing = still_missing(&res, &state);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].external_id, id);
        assert!(!can_continue(&res, &state));
    }

    #[test]
    fn uploaded_file_records_sha1() {
        let file = UploadedFile::new(b"abc".to_vec());
        assert_eq!(file.sha1, "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(file.size, 3);
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(is_accepted_upload("Mod.JAR", &exts()));
        assert!(is_accepted_upload("textures.zip", &exts()));
        assert!(!is_accepted_upload(".jar", &exts()));
        assert!(!is_accepted_upload("mod.jar.txt", &exts()));
    }
}
