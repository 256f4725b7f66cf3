use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::error::ValidationFailure;
use crate::core::manifest::{FileReference, ParsedModpackData, SourceFormat};
use crate::core::rebuild::RebuildRequest;
use crate::core::resolver::{RemoteFileMetadata, UploadedFile};
use crate::core::worker::WorkerMode;

/// Lifecycle of one validation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "failure", rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    /// A worker is running for the current token.
    Parsing,
    /// Nothing left to fix; may continue.
    Parsed,
    /// Some unresolved files are not in the overrides.
    ParsedWithIssues,
    /// The user is supplying missing files.
    AwaitingRemediation,
    /// Continue was accepted; the session has been handed off.
    Resolved,
    Failed(ValidationFailure),
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Parsing => write!(f, "parsing"),
            SessionState::Parsed => write!(f, "parsed"),
            SessionState::ParsedWithIssues => write!(f, "parsed with issues"),
            SessionState::AwaitingRemediation => write!(f, "awaiting remediation"),
            SessionState::Resolved => write!(f, "resolved"),
            SessionState::Failed(failure) => write!(f, "failed ({})", failure.kind),
        }
    }
}

/// A file the user picked, plus whatever the caller already fetched for it.
#[derive(Debug, Clone)]
pub struct ModpackSelection {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub metadata: Option<Vec<RemoteFileMetadata>>,
    pub mode: WorkerMode,
}

impl ModpackSelection {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            metadata: None,
            mode: WorkerMode::FullValidate,
        }
    }

    pub fn with_metadata(mut self, metadata: Vec<RemoteFileMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_mode(mut self, mode: WorkerMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Final decision handed to the archive rebuilder.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuePayload {
    pub session_id: Uuid,
    pub file_name: String,
    pub data: ParsedModpackData,
    pub source_format: SourceFormat,
    pub overrides_root: String,
    pub unresolved_files: Vec<FileReference>,
    pub overrides_present: Vec<String>,
    pub upload_map: BTreeMap<String, UploadedFile>,
    pub resolved_at: DateTime<Utc>,
    #[serde(skip)]
    pub archive_bytes: Vec<u8>,
}

impl ContinuePayload {
    pub fn needs_rebuild(&self) -> bool {
        !self.upload_map.is_empty()
    }

    pub fn into_rebuild_request(self) -> RebuildRequest {
        RebuildRequest {
            archive_bytes: self.archive_bytes,
            overrides_root: self.overrides_root,
            upload_map: self.upload_map,
        }
    }
}
