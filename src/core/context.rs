use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::core::config::ValidatorSettings;

/// Everything a validation session needs from its surroundings.
/// Passed explicitly; there is no global instance.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    settings: Arc<ValidatorSettings>,
}

impl ValidationContext {
    pub fn new(settings: ValidatorSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    pub fn from_data_dir(data_dir: &Path) -> Self {
        Self::new(ValidatorSettings::load_or_default(data_dir))
    }

    pub fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    pub fn accepted_extensions(&self) -> &[String] {
        &self.settings.accepted_upload_extensions
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.settings.response_timeout()
    }
}
