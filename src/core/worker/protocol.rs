// ─── Worker Protocol ───
// Exactly one request in, exactly one reply out. Everything crosses by
// value; the worker never sees orchestrator memory.

use serde::{Deserialize, Serialize};

use crate::core::error::ValidationFailure;
use crate::core::manifest::{ExternalId, ParsedManifest};
use crate::core::resolver::{RemoteFileMetadata, ValidationResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum WorkerMode {
    /// Parse and evaluate resolvability.
    FullValidate,
    /// Parse only; no metadata join, no override probing.
    ExtractManifestOnly,
    /// Just the external ids, so the caller knows what to look up remotely.
    ListExternalIds,
}

#[derive(Debug, Clone)]
pub struct WorkerRequest {
    pub archive_bytes: Vec<u8>,
    pub metadata: Option<Vec<RemoteFileMetadata>>,
    pub mode: WorkerMode,
}

impl WorkerRequest {
    pub fn new(archive_bytes: Vec<u8>, mode: WorkerMode) -> Self {
        Self {
            archive_bytes,
            metadata: None,
            mode,
        }
    }

    pub fn with_metadata(mut self, metadata: Vec<RemoteFileMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum WorkerOutput {
    Validated(ValidationResult),
    Manifest(ParsedManifest),
    ExternalIds(Vec<ExternalId>),
}

pub type WorkerReply = Result<WorkerOutput, ValidationFailure>;

/// Monotonic per-orchestrator session number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(pub u64);

impl SessionToken {
    pub fn next(self) -> Self {
        SessionToken(self.0 + 1)
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A reply tagged with the session that asked for it.
#[derive(Debug, Clone)]
pub struct WorkerEnvelope {
    pub token: SessionToken,
    pub reply: WorkerReply,
}
