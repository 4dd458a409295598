//! Settings file management.
//!
//! Reads `.cellar.toml` from the working directory, falling back to
//! `~/.cellar/config.toml`. Missing files mean defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants::{GLOBAL_SETTINGS_FILE, HASH_MAX_LENGTH, SETTINGS_FILE};
use crate::error::{ConfigError, Result};

/// Settings stored in `.cellar.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub cellar: Meta,
}

/// The `[cellar]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Vault used when a command is given none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault: Option<PathBuf>,
    /// Hash length for new vaults.
    #[serde(default)]
    pub hash_length: u8,
}

impl Settings {
    /// Load settings for the current directory and user.
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::load_from(&cwd, dirs::home_dir().as_deref())
    }

    /// Load from `project/.cellar.toml`, else `home/.cellar/config.toml`.
    pub fn load_from(project: &Path, home: Option<&Path>) -> Result<Self> {
        let candidates = std::iter::once(project.join(SETTINGS_FILE))
            .chain(home.map(|h| h.join(GLOBAL_SETTINGS_FILE)));

        for path in candidates {
            if path.is_file() {
                return Self::read(&path);
            }
        }
        debug!("no settings file, using defaults");
        Ok(Self::default())
    }

    /// Parse one settings file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::InvalidValue` for out-of-range values.
    pub fn read(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading settings");
        let contents = fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "saving settings");
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.cellar.hash_length > HASH_MAX_LENGTH {
            return Err(ConfigError::InvalidValue {
                field: "hash_length",
                reason: format!("must be at most {}", HASH_MAX_LENGTH),
            }
            .into());
        }
        Ok(())
    }

    /// Pick `explicit` if given, else the configured default vault.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoVault` if neither is set.
    pub fn vault_path(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.cellar.vault.clone())
            .ok_or_else(|| ConfigError::NoVault.into())
    }
}
