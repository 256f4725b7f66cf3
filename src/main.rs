use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use modpack_gate_lib::commands::{self, ValidateOptions};
use modpack_gate_lib::core::config;
use modpack_gate_lib::core::context::ValidationContext;
use modpack_gate_lib::core::worker::WorkerMode;

#[derive(Parser)]
#[command(
    name = "modpack-gate",
    version,
    about = "Validate CurseForge / Modrinth modpack archives before import"
)]
struct Cli {
    /// Directory holding validator_settings.json. Default: platform data dir.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an archive and print the outcome as JSON
    Validate {
        archive: PathBuf,

        /// JSON array of remote file metadata for the pack's external ids
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// File supplied for a missing entry; its name must match exactly. Repeatable.
        #[arg(long = "upload")]
        uploads: Vec<PathBuf>,

        #[arg(long, value_enum, default_value_t = Mode::Full)]
        mode: Mode,
    },

    /// Print the effective validator settings
    Settings,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Parse and evaluate resolvability
    Full,
    /// Parse the manifest only
    Manifest,
    /// List external ids needing a metadata lookup
    Ids,
}

impl From<Mode> for WorkerMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Full => WorkerMode::FullValidate,
            Mode::Manifest => WorkerMode::ExtractManifestOnly,
            Mode::Ids => WorkerMode::ListExternalIds,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    modpack_gate_lib::init_logging();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(config::default_data_dir);

    match cli.cmd {
        Commands::Validate {
            archive,
            metadata,
            uploads,
            mode,
        } => {
            let ctx = ValidationContext::from_data_dir(&data_dir);
            let options = ValidateOptions {
                archive: archive.clone(),
                metadata,
                uploads,
                mode: mode.into(),
            };
            let response = commands::validate_modpack(ctx, options)
                .await
                .with_context(|| format!("validating {}", archive.display()))?;

            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.is_success() {
                bail!("{} cannot continue", archive.display());
            }
        }
        Commands::Settings => {
            let payload = commands::get_validator_settings(&data_dir);
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    Ok(())
}
