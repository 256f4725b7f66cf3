use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::config::ValidatorSettings;
use crate::core::context::ValidationContext;
use crate::core::error::{ValidationFailure, ValidatorError, ValidatorResult};
use crate::core::manifest::{ExternalId, FileReference, ParsedManifest};
use crate::core::resolver::RemoteFileMetadata;
use crate::core::session::{
    ContinuePayload, ModpackSelection, SessionState, ValidationOrchestrator,
};
use crate::core::worker::{WorkerMode, WorkerOutput};

#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub archive: PathBuf,
    pub metadata: Option<PathBuf>,
    pub uploads: Vec<PathBuf>,
    pub mode: WorkerMode,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedUpload {
    pub file_name: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum ValidateResponse {
    Continued(ContinuePayload),
    #[serde(rename_all = "camelCase")]
    Blocked {
        still_missing: Vec<FileReference>,
        rejected_uploads: Vec<RejectedUpload>,
    },
    Failed(ValidationFailure),
    Manifest(ParsedManifest),
    ExternalIds(Vec<ExternalId>),
}

impl ValidateResponse {
    pub fn is_success(&self) -> bool {
        !matches!(
            self,
            ValidateResponse::Blocked { .. } | ValidateResponse::Failed(_)
        )
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPayload {
    pub data_dir: String,
    pub response_timeout_secs: u64,
    pub accepted_upload_extensions: Vec<String>,
}

impl SettingsPayload {
    pub fn from_settings(settings: &ValidatorSettings, data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_string_lossy().to_string(),
            response_timeout_secs: settings.response_timeout_secs,
            accepted_upload_extensions: settings.accepted_upload_extensions.clone(),
        }
    }
}

pub fn get_validator_settings(data_dir: &Path) -> SettingsPayload {
    let settings = ValidatorSettings::load_or_default(data_dir);
    SettingsPayload::from_settings(&settings, data_dir)
}

/// Run one archive through a full session: validate, apply any uploads,
/// and continue when nothing is missing.
pub async fn validate_modpack(
    ctx: ValidationContext,
    options: ValidateOptions,
) -> ValidatorResult<ValidateResponse> {
    let bytes = tokio::fs::read(&options.archive).await?;
    let file_name = file_name_of(&options.archive);

    let mut selection = ModpackSelection::new(file_name, bytes).with_mode(options.mode);
    if let Some(path) = &options.metadata {
        selection = selection.with_metadata(read_metadata(path).await?);
    }

    let mut orchestrator = ValidationOrchestrator::new(ctx);
    orchestrator.select_file(selection);

    match orchestrator.next_response().await.clone() {
        SessionState::Failed(failure) => return Ok(ValidateResponse::Failed(failure)),
        SessionState::Parsed => {
            if let Some(output) = orchestrator.last_output().cloned() {
                return match output {
                    WorkerOutput::Manifest(parsed) => Ok(ValidateResponse::Manifest(parsed)),
                    WorkerOutput::ExternalIds(ids) => Ok(ValidateResponse::ExternalIds(ids)),
                    WorkerOutput::Validated(_) => Err(ValidatorError::InternalFault(
                        "validation result stored as raw output".into(),
                    )),
                };
            }
            if !options.uploads.is_empty() {
                debug!("Archive needs no remediation, ignoring uploads");
            }
        }
        SessionState::ParsedWithIssues => {
            orchestrator.begin_remediation()?;
            let rejected = apply_uploads(&mut orchestrator, &options.uploads).await?;

            if !orchestrator.can_continue() {
                let still_missing = orchestrator
                    .still_missing()
                    .into_iter()
                    .cloned()
                    .collect::<Vec<_>>();
                warn!("{} files still missing", still_missing.len());
                return Ok(ValidateResponse::Blocked {
                    still_missing,
                    rejected_uploads: rejected,
                });
            }
        }
        other => {
            return Err(ValidatorError::InternalFault(format!(
                "session ended in unexpected state: {}",
                other
            )))
        }
    }

    let payload = orchestrator.continue_session()?;
    info!(
        "Continuing with '{}' ({} uploads)",
        payload.file_name,
        payload.upload_map.len()
    );
    Ok(ValidateResponse::Continued(payload))
}

async fn apply_uploads(
    orchestrator: &mut ValidationOrchestrator,
    uploads: &[PathBuf],
) -> ValidatorResult<Vec<RejectedUpload>> {
    let mut rejected = Vec::new();
    for path in uploads {
        let file_name = file_name_of(path);
        let bytes = tokio::fs::read(path).await?;
        if let Err(e) = orchestrator.upload_file(&file_name, bytes) {
            warn!("Upload '{}' rejected: {}", file_name, e);
            rejected.push(RejectedUpload {
                file_name,
                reason: e.to_string(),
            });
        }
    }
    Ok(rejected)
}

async fn read_metadata(path: &Path) -> ValidatorResult<Vec<RemoteFileMetadata>> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
