use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Central error type for the validation engine.
/// Every module returns `Result<T, ValidatorError>`.
#[derive(Debug, Error)]
pub enum ValidatorError {
    // ── Archive ─────────────────────────────────────────
    #[error("Archive could not be indexed: {0}")]
    CorruptArchive(String),

    #[error("Entry not found in archive: {0}")]
    EntryNotFound(String),

    // ── Manifest ────────────────────────────────────────
    #[error("No manifest.json or modrinth.index.json found in archive")]
    NoManifestFound,

    #[error("Invalid modloader format: {0}")]
    InvalidModloaderFormat(String),

    #[error("Unsupported game '{0}', expected 'minecraft'")]
    UnsupportedGame(String),

    #[error("No supported modloader declared in dependencies")]
    NoModloaderFound,

    #[error("Malformed manifest {path}: {reason}")]
    MalformedManifest { path: String, reason: String },

    // ── Remediation ─────────────────────────────────────
    #[error("Uploaded file '{0}' is empty")]
    EmptyUpload(String),

    #[error("Unsupported upload type for '{0}', expected .jar or .zip")]
    UnsupportedUploadType(String),

    #[error("'{0}' is not one of the unresolved files")]
    UnknownUpload(String),

    #[error("'{0}' is already present in the overrides folder")]
    AlreadyInOverrides(String),

    #[error("Cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: String },

    #[error("Unresolved files remain: {0}")]
    CannotContinue(String),

    // ── Worker ──────────────────────────────────────────
    #[error("Validation worker fault: {0}")]
    InternalFault(String),

    // ── Wrapped ─────────────────────────────────────────
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type ValidatorResult<T> = Result<T, ValidatorError>;

/// Failure kinds that cross the worker boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FailureKind {
    CorruptArchive,
    NoManifestFound,
    InvalidModloaderFormat,
    UnsupportedGame,
    NoModloaderFound,
    MalformedManifest,
    InternalFault,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::CorruptArchive => "CorruptArchive",
            FailureKind::NoManifestFound => "NoManifestFound",
            FailureKind::InvalidModloaderFormat => "InvalidModloaderFormat",
            FailureKind::UnsupportedGame => "UnsupportedGame",
            FailureKind::NoModloaderFound => "NoModloaderFound",
            FailureKind::MalformedManifest => "MalformedManifest",
            FailureKind::InternalFault => "InternalFault",
        };
        f.write_str(name)
    }
}

/// Structured failure reply: `{kind, message}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InternalFault, message)
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl ValidatorError {
    /// Project this error onto the wire failure taxonomy.
    ///
    /// Anything that is not one of the per-archive failures is an internal
    /// fault from the caller's point of view.
    pub fn failure(&self) -> ValidationFailure {
        let kind = match self {
            ValidatorError::CorruptArchive(_) | ValidatorError::Zip(_) => {
                FailureKind::CorruptArchive
            }
            ValidatorError::NoManifestFound => FailureKind::NoManifestFound,
            ValidatorError::InvalidModloaderFormat(_) => FailureKind::InvalidModloaderFormat,
            ValidatorError::UnsupportedGame(_) => FailureKind::UnsupportedGame,
            ValidatorError::NoModloaderFound => FailureKind::NoModloaderFound,
            ValidatorError::MalformedManifest { .. } | ValidatorError::Json(_) => {
                FailureKind::MalformedManifest
            }
            _ => FailureKind::InternalFault,
        };
        ValidationFailure::new(kind, self.to_string())
    }
}

// Callers that bridge to an IPC layer need the error as a plain string.
impl Serialize for ValidatorError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
