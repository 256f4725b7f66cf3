pub mod orchestrator;
pub mod state;

pub use orchestrator::ValidationOrchestrator;
pub use state::{ContinuePayload, ModpackSelection, SessionState};
