//! Application configuration management.
//!
//! Stored at `~/.config/storecrawl/config.json`. Missing fields fall back to
//! their defaults so an old or hand-written file keeps loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fdroid::DEFAULT_CONCURRENCY;
use crate::play::{DeviceProfile, DEFAULT_DEVICE};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "storecrawl";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_LOCALE: &str = "en_US";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub last_account: Option<String>,
    pub locale: String,
    pub timeout_secs: u64,
    /// Name of the emulated device, either `bacon` or a key of `devices`.
    pub device: String,
    pub fdroid_concurrency: usize,
    pub log_dir: Option<PathBuf>,
    pub devices: HashMap<String, DeviceProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            last_account: None,
            locale: DEFAULT_LOCALE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            device: DEFAULT_DEVICE.to_string(),
            fdroid_concurrency: DEFAULT_CONCURRENCY,
            log_dir: None,
            devices: HashMap::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// The configured device, custom profiles taking precedence over the
    /// built-in one.
    pub fn device_profile(&self) -> Result<DeviceProfile> {
        if let Some(profile) = self.devices.get(&self.device) {
            return Ok(profile.clone());
        }
        if self.device == DEFAULT_DEVICE {
            return Ok(DeviceProfile::default());
        }
        anyhow::bail!("Unknown device profile '{}'", self.device)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.locale, "en_US");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.fdroid_concurrency, 4);
        assert_eq!(config.device_profile().unwrap(), DeviceProfile::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"last_account": "someone@example.com", "timeout_secs": 5}"#)
                .unwrap();
        assert_eq!(config.last_account.as_deref(), Some("someone@example.com"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.device, "bacon");
        assert_eq!(config.locale, "en_US");
    }

    #[test]
    fn test_custom_and_unknown_devices() {
        let mut custom = DeviceProfile::default();
        custom.user_readable_name = "Pixel".into();

        let mut config = Config::default();
        config.device = "pixel".into();
        assert!(config.device_profile().is_err());

        config.devices.insert("pixel".into(), custom.clone());
        assert_eq!(config.device_profile().unwrap(), custom);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        assert_eq!(Config::load_from(&path).unwrap().locale, "en_US");

        let mut config = Config::default();
        config.locale = "de_DE".into();
        config.log_dir = Some(dir.path().join("logs"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.locale, "de_DE");
        assert_eq!(loaded.log_dir, config.log_dir);
    }
}
