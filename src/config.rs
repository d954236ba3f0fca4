use crate::application::engine::EngineSettings;
use crate::domain::release::SchemaRelease;
use crate::error::{CourierError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Service configuration, read from a JSON file.
///
/// Every field is optional; missing fields take the values in
/// [`Config::default`]. Unknown fields are rejected so that a typo fails at
/// startup instead of being silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub service_name: String,
    pub sender: String,
    pub message_id_scheme: String,
    pub address_scheme: String,
    pub default_release: ReleaseConfig,
    pub wait_timeout_ms: Option<u64>,
}

/// The release used when a document's own release cannot be determined.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    pub version: String,
    pub view: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        let release = SchemaRelease::default();
        Self {
            version: release.version().to_string(),
            view: release.view().as_str().to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let settings = EngineSettings::default();
        Self {
            service_name: settings.service_name,
            sender: settings.sender,
            message_id_scheme: settings.message_id_scheme,
            address_scheme: settings.address_scheme,
            default_release: ReleaseConfig::default(),
            wait_timeout_ms: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| CourierError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Resolves the engine settings, failing if the default release is not
    /// one the service supports.
    pub fn engine_settings(&self) -> Result<EngineSettings> {
        let ReleaseConfig { version, view } = &self.default_release;
        let default_release = SchemaRelease::lookup(version, view).ok_or_else(|| {
            CourierError::ConfigError(format!(
                "unsupported default release: version {version:?}, view {view:?}"
            ))
        })?;

        Ok(EngineSettings {
            service_name: self.service_name.clone(),
            sender: self.sender.clone(),
            message_id_scheme: self.message_id_scheme.clone(),
            address_scheme: self.address_scheme.clone(),
            default_release,
        })
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }
}
