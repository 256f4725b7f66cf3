// ─── ModpackGate Core ───
// Validation engine for modpack archives uploaded by users.
//
// Architecture:
//   core/
//     archive/   - Zip indexing + entry reads
//     manifest/  - Format detection, CurseForge + Modrinth parsers
//     resolver/  - Resolvability evaluation + remediation bookkeeping
//     worker/    - Isolated execution boundary (one request, one reply)
//     session/   - Orchestrator state machine + session tokens
//     rebuild    - Archive rebuilder seam
//     config     - Persisted validator settings
//     context    - Explicit per-orchestrator context

pub mod archive;
pub mod config;
pub mod context;
pub mod error;
pub mod manifest;
pub mod rebuild;
pub mod resolver;
pub mod session;
pub mod worker;
