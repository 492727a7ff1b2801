//! Config - Quicksave settings and where they live

use crate::{Error, Result, DEFAULT_FORMAT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "QUICKSAVE_CONFIG_DIR";

/// Settings file name inside the config directory
pub const CONFIG_FILE: &str = "quicksave.json";

/// Quicksave settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Slot file extension, including any leading separator (".sna")
    #[serde(default = "default_format")]
    pub format: String,
    /// Shard save directories by emulated machine
    #[serde(default)]
    pub per_machine: bool,
    /// Default slot used by quicksave/quickload
    #[serde(default)]
    pub slot: u8,
    /// Root for the savestates tree; the config directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_root: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            format: default_format(),
            per_machine: false,
            slot: 0,
            config_root: None,
        }
    }
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

impl Settings {
    /// Load settings from the config directory
    pub fn load() -> Result<Self> {
        let dir = config_dir().ok_or(Error::NoConfigRoot)?;
        Self::load_from(&dir.join(CONFIG_FILE))
    }

    /// Load from a specific file, falling back to defaults when it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        debug!("Reading settings from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        debug!("Wrote settings to {:?}", path);
        Ok(())
    }

    /// Check the format is a 3 or 4 character extension
    pub fn validate(&self) -> Result<()> {
        let len = self.format.chars().count();
        if !(3..=4).contains(&len) || self.format.contains(['/', '\\']) {
            return Err(Error::InvalidFormat(self.format.clone()));
        }
        Ok(())
    }

    /// Root of the savestates tree, if one can be determined
    pub fn config_root(&self) -> Option<PathBuf> {
        self.config_root.clone().or_else(config_dir)
    }
}

/// Config directory: `$QUICKSAVE_CONFIG_DIR`, else the platform config dir
pub fn config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join("quicksave")),
    }
}
