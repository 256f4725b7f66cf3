// ─── Execution Boundary ───
// Archive parsing is synchronous and can take a while on large packs, so it
// runs on tokio's blocking pool. Whatever happens in there, the caller gets
// exactly one reply.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::protocol::{
    SessionToken, WorkerEnvelope, WorkerMode, WorkerOutput, WorkerReply, WorkerRequest,
};
use crate::core::archive::ModpackArchive;
use crate::core::error::{ValidationFailure, ValidatorResult};
use crate::core::manifest::{self, ManifestDescriptor};
use crate::core::resolver;

/// Map one request to one reply. Errors and panics become failures.
pub fn handle_request(request: WorkerRequest) -> WorkerReply {
    let mode = request.mode;
    let started = Instant::now();
    let reply = guarded(move || process(request));

    match &reply {
        Ok(_) => debug!("Worker finished {:?} in {:?}", mode, started.elapsed()),
        Err(failure) => info!("Worker rejected archive ({:?}): {}", mode, failure),
    }
    reply
}

fn process(request: WorkerRequest) -> ValidatorResult<WorkerOutput> {
    let WorkerRequest {
        archive_bytes,
        metadata,
        mode,
    } = request;

    let archive = ModpackArchive::load(archive_bytes)?;

    match mode {
        WorkerMode::ListExternalIds => {
            let ids = match manifest::read_descriptor(&archive)? {
                ManifestDescriptor::CurseForge(manifest) => manifest.external_ids(),
                ManifestDescriptor::Modrinth(_) => Vec::new(),
            };
            Ok(WorkerOutput::ExternalIds(ids))
        }
        WorkerMode::ExtractManifestOnly => {
            Ok(WorkerOutput::Manifest(manifest::parse_manifest(&archive)?))
        }
        WorkerMode::FullValidate => {
            let parsed = manifest::parse_manifest(&archive)?;
            let result = resolver::evaluate(&archive, parsed, metadata.as_deref());
            Ok(WorkerOutput::Validated(result))
        }
    }
}

fn guarded<F>(work: F) -> WorkerReply
where
    F: FnOnce() -> ValidatorResult<WorkerOutput>,
{
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(e.failure()),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("Worker panicked: {}", message);
            Err(ValidationFailure::internal(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Start a fresh worker for one session. Its reply lands in `reply_to`
/// tagged with `token`; nothing else is ever sent.
pub fn spawn_worker(
    token: SessionToken,
    request: WorkerRequest,
    reply_to: mpsc::UnboundedSender<WorkerEnvelope>,
) -> JoinHandle<()> {
    debug!(
        "Spawning worker {} ({:?}, {} bytes)",
        token,
        request.mode,
        request.archive_bytes.len()
    );
    tokio::task::spawn_blocking(move || {
        let reply = handle_request(request);
        if reply_to.send(WorkerEnvelope { token, reply }).is_err() {
            debug!("Orchestrator dropped before worker {} replied", token);
        }
    })
}

/// One-shot isolated run for callers that don't need a session.
pub async fn run_isolated(request: WorkerRequest) -> WorkerReply {
    match tokio::task::spawn_blocking(move || handle_request(request)).await {
        Ok(reply) => reply,
        Err(join_error) => Err(ValidationFailure::internal(join_error.to_string())),
    }
}
