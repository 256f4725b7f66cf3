pub mod evaluator;
pub mod metadata;
pub mod remediation;

pub use evaluator::{evaluate, is_in_overrides, ValidationResult};
pub use metadata::{MetadataIndex, RemoteFileMetadata};
pub use remediation::{can_continue, still_missing, RemediationEntry, RemediationState, UploadedFile};
