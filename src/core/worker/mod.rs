pub mod boundary;
pub mod protocol;

pub use boundary::{handle_request, run_isolated, spawn_worker};
pub use protocol::{
    SessionToken, WorkerEnvelope, WorkerMode, WorkerOutput, WorkerReply, WorkerRequest,
};
