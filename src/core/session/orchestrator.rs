// ─── Validation Orchestrator ───
// Owns the current session and is its only mutator. Each file selection
// gets a fresh token and a fresh worker; replies carrying any other token
// are dropped on the floor, which is how an abandoned run gets cancelled.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::{ContinuePayload, ModpackSelection, SessionState};
use crate::core::context::ValidationContext;
use crate::core::error::{ValidationFailure, ValidatorError, ValidatorResult};
use crate::core::manifest::FileReference;
use crate::core::resolver::{self, RemediationState, ValidationResult};
use crate::core::worker::{self, SessionToken, WorkerEnvelope, WorkerOutput, WorkerRequest};

struct Session {
    id: Uuid,
    token: SessionToken,
    file_name: String,
    archive_bytes: Vec<u8>,
    started_at: DateTime<Utc>,
    result: Option<ValidationResult>,
    output: Option<WorkerOutput>,
    remediation: Option<RemediationState>,
}

pub struct ValidationOrchestrator {
    ctx: ValidationContext,
    state: SessionState,
    last_token: SessionToken,
    session: Option<Session>,
    inbox_tx: mpsc::UnboundedSender<WorkerEnvelope>,
    inbox_rx: mpsc::UnboundedReceiver<WorkerEnvelope>,
}

impl ValidationOrchestrator {
    pub fn new(ctx: ValidationContext) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            ctx,
            state: SessionState::Idle,
            last_token: SessionToken(0),
            session: None,
            inbox_tx,
            inbox_rx,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_token(&self) -> Option<SessionToken> {
        self.session.as_ref().map(|s| s.token)
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn validation_result(&self) -> Option<&ValidationResult> {
        self.session.as_ref().and_then(|s| s.result.as_ref())
    }

    /// Output of an `ExtractManifestOnly` / `ListExternalIds` run.
    pub fn last_output(&self) -> Option<&WorkerOutput> {
        self.session.as_ref().and_then(|s| s.output.as_ref())
    }

    pub fn remediation(&self) -> Option<&RemediationState> {
        self.session.as_ref().and_then(|s| s.remediation.as_ref())
    }

    // ── Events ──────────────────────────────────────────

    /// Abandon whatever is running and start validating `selection`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn select_file(&mut self, selection: ModpackSelection) -> SessionToken {
        let (token, request) = self.open_session(selection);
        worker::spawn_worker(token, request, self.inbox_tx.clone());
        token
    }

    /// Replace the session and mint its token. The caller owns the request.
    fn open_session(&mut self, selection: ModpackSelection) -> (SessionToken, WorkerRequest) {
        if let Some(old) = self.session.take() {
            debug!("Abandoning session {} ({})", old.token, old.file_name);
        }

        let token = self.last_token.next();
        self.last_token = token;

        let ModpackSelection {
            file_name,
            bytes,
            metadata,
            mode,
        } = selection;

        let mut request = WorkerRequest::new(bytes.clone(), mode);
        request.metadata = metadata;

        let session = Session {
            id: Uuid::new_v4(),
            token,
            file_name,
            archive_bytes: bytes,
            started_at: Utc::now(),
            result: None,
            output: None,
            remediation: None,
        };
        info!(
            "Validating '{}' as session {} ({})",
            session.file_name, session.id, token
        );

        self.session = Some(session);
        self.state = SessionState::Parsing;
        (token, request)
    }

    /// Apply a worker reply. Returns `false` when the reply was stale.
    pub fn on_response(&mut self, envelope: WorkerEnvelope) -> bool {
        let session = match self.session.as_mut() {
            Some(s) if s.token == envelope.token && self.state == SessionState::Parsing => s,
            _ => {
                debug!("Discarding stale reply for {}", envelope.token);
                return false;
            }
        };

        let elapsed = Utc::now() - session.started_at;
        self.state = match envelope.reply {
            Ok(WorkerOutput::Validated(result)) => {
                let needs_remediation = result.needs_remediation();
                if !result.unresolved_files.is_empty() {
                    session.remediation = Some(RemediationState::from_result(&result));
                }
                info!(
                    "Session {} validated in {}ms: {} unresolved, {} in overrides",
                    session.token,
                    elapsed.num_milliseconds(),
                    result.unresolved_files.len(),
                    result.overrides_present.len()
                );
                session.result = Some(result);
                if needs_remediation {
                    SessionState::ParsedWithIssues
                } else {
                    SessionState::Parsed
                }
            }
            Ok(output) => {
                session.output = Some(output);
                SessionState::Parsed
            }
            Err(failure) => {
                warn!("Session {} failed: {}", session.token, failure);
                SessionState::Failed(failure)
            }
        };
        true
    }

    /// Wait for the current session's reply, skipping stale ones.
    ///
    /// Gives up after the configured timeout and fails the session.
    pub async fn next_response(&mut self) -> &SessionState {
        let deadline = self
            .ctx
            .response_timeout()
            .map(|t| tokio::time::Instant::now() + t);

        while self.state == SessionState::Parsing {
            let received = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, self.inbox_rx.recv()).await {
                        Ok(received) => received,
                        Err(_) => {
                            warn!("No worker reply before the deadline");
                            self.state = SessionState::Failed(ValidationFailure::internal(
                                "validation worker did not reply in time",
                            ));
                            break;
                        }
                    }
                }
                None => self.inbox_rx.recv().await,
            };

            match received {
                Some(envelope) => {
                    self.on_response(envelope);
                }
                None => {
                    self.state = SessionState::Failed(ValidationFailure::internal(
                        "worker channel closed",
                    ));
                }
            }
        }
        &self.state
    }

    pub fn begin_remediation(&mut self) -> ValidatorResult<()> {
        match self.state {
            SessionState::ParsedWithIssues => {
                self.state = SessionState::AwaitingRemediation;
                Ok(())
            }
            _ => Err(self.invalid("begin remediation")),
        }
    }

    pub fn upload_file(&mut self, file_name: &str, bytes: Vec<u8>) -> ValidatorResult<()> {
        if self.state != SessionState::AwaitingRemediation {
            return Err(self.invalid("upload a file"));
        }
        let remediation = self
            .session
            .as_mut()
            .and_then(|s| s.remediation.as_mut())
            .ok_or_else(|| ValidatorError::UnknownUpload(file_name.to_string()))?;

        remediation.upload(file_name, bytes, self.ctx.accepted_extensions())?;
        debug!("Accepted upload for '{}'", file_name);
        Ok(())
    }

    pub fn remove_upload(&mut self, file_name: &str) -> ValidatorResult<bool> {
        if self.state != SessionState::AwaitingRemediation {
            return Err(self.invalid("remove an upload"));
        }
        Ok(self
            .session
            .as_mut()
            .and_then(|s| s.remediation.as_mut())
            .map(|r| r.remove_upload(file_name))
            .unwrap_or(false))
    }

    /// Unresolved files still lacking an override or upload.
    pub fn still_missing(&self) -> Vec<&FileReference> {
        match self.session.as_ref() {
            Some(Session {
                result: Some(result),
                remediation,
                ..
            }) => match remediation {
                Some(state) => resolver::still_missing(result, state),
                None => result.effective_unresolved().collect(),
            },
            _ => Vec::new(),
        }
    }

    pub fn can_continue(&self) -> bool {
        let continuable = matches!(
            self.state,
            SessionState::Parsed
                | SessionState::ParsedWithIssues
                | SessionState::AwaitingRemediation
        );
        continuable && self.validation_result().is_some() && self.still_missing().is_empty()
    }

    /// Hand off the session. Consumes the remediation state.
    pub fn continue_session(&mut self) -> ValidatorResult<ContinuePayload> {
        if self.validation_result().is_none() {
            return Err(self.invalid("continue"));
        }
        if !self.can_continue() {
            let missing: Vec<String> = self
                .still_missing()
                .iter()
                .map(|f| f.file_name.clone())
                .collect();
            if missing.is_empty() {
                return Err(self.invalid("continue"));
            }
            return Err(ValidatorError::CannotContinue(missing.join(", ")));
        }

        let session = self
            .session
            .take()
            .ok_or_else(|| self.invalid("continue"))?;
        let result = session
            .result
            .ok_or_else(|| ValidatorError::InternalFault("session lost its result".into()))?;
        let upload_map = session
            .remediation
            .map(RemediationState::into_upload_map)
            .unwrap_or_default();

        info!(
            "Session {} resolved with {} uploaded files",
            session.id,
            upload_map.len()
        );
        self.state = SessionState::Resolved;

        Ok(ContinuePayload {
            session_id: session.id,
            file_name: session.file_name,
            data: result.manifest,
            source_format: result.source_format,
            overrides_root: result.overrides_root,
            unresolved_files: result.unresolved_files,
            overrides_present: result.overrides_present.into_iter().collect(),
            upload_map,
            resolved_at: Utc::now(),
            archive_bytes: session.archive_bytes,
        })
    }

    /// Drop the session and go back to idle.
    pub fn reset(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("Resetting session {}", session.token);
        }
        self.state = SessionState::Idle;
    }

    fn invalid(&self, action: &'static str) -> ValidatorError {
        ValidatorError::InvalidTransition {
            action,
            state: self.state.to_string(),
        }
    }
}
