use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const APP_DIR_NAME: &str = "ModpackGate";
const SETTINGS_FILE: &str = "validator_settings.json";

/// Tunables persisted as `validator_settings.json` in the data directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ValidatorSettings {
    /// How long the orchestrator waits for a worker reply. `0` waits forever.
    pub response_timeout_secs: u64,
    /// Extensions a manual upload may carry.
    pub accepted_upload_extensions: Vec<String>,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            response_timeout_secs: 120,
            accepted_upload_extensions: vec![".jar".into(), ".zip".into()],
        }
    }
}

impl ValidatorSettings {
    pub fn response_timeout(&self) -> Option<Duration> {
        (self.response_timeout_secs > 0).then(|| Duration::from_secs(self.response_timeout_secs))
    }

    /// Load from `data_dir`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_or_default(data_dir: &Path) -> Self {
        match load_settings_from_disk(data_dir) {
            Some(settings) => settings,
            None => {
                debug!("No settings in {:?}, using defaults", data_dir);
                Self::default()
            }
        }
    }

    pub fn save(&self, data_dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(data_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(data_dir.join(SETTINGS_FILE), json)
    }
}

fn load_settings_from_disk(data_dir: &Path) -> Option<ValidatorSettings> {
    let path = data_dir.join(SETTINGS_FILE);
    let raw = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!("Ignoring unreadable settings {:?}: {}", path, e);
            None
        }
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
