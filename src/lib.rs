pub mod commands;
pub mod core;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Logs go to stderr so stdout stays
/// free for command output.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,modpack_gate_lib=debug")),
        )
        .with_writer(std::io::stderr)
        .init();
}
