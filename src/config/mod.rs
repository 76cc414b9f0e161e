pub mod device_config;
pub mod output_config;
pub mod scan_config;

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::config::device_config::DeviceConfig;
use crate::config::output_config::OutputConfig;
use crate::config::scan_config::ScanConfig;
use crate::core::bluetooth::MachineConfig;
use crate::error::ConfigError;
use crate::utils::ensure_directory_exists;

const CONFIG_DIR_NAME: &str = "sensortag-bridge";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scan: ScanConfig,
    pub device: DeviceConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// `<platform config dir>/sensortag-bridge/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("No configuration directory on this platform"))?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the config from a configuration file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file_path = path.as_ref();

        if !file_path.exists() {
            warn!("Config file not found at {:?}, using default.", file_path);
            return Ok(Self::default());
        }

        let config_json = fs::read_to_string(file_path).await?;
        let config: Self = serde_json::from_str(&config_json)?;

        info!("Config loaded from {:?}", file_path);
        Ok(config)
    }

    /// Saves the config, creating the parent directory if needed.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file_path = path.as_ref();
        if let Some(config_dir) = file_path.parent() {
            ensure_directory_exists(config_dir).await?;
        }

        let config_json = match serde_json::to_string_pretty(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize config to JSON: {}", e);
                return Err(e.into());
            }
        };

        fs::write(file_path, config_json).await?;

        info!("Config saved to {:?}.", file_path);
        Ok(())
    }

    /// Validates the settings and builds the state machine configuration.
    pub fn machine_config(&self) -> Result<MachineConfig, ConfigError> {
        Ok(MachineConfig {
            matcher: self.device.matcher()?,
            scan_filter: self.scan.scan_filter(),
            scan_window: self.scan.scan_window()?,
            pause_window: self.scan.pause_window()?,
            min_rssi: self.device.min_rssi,
            channel_policy: self.device.channel_policy,
            scan_on_power_on: self.scan.scan_on_power_on,
        })
    }
}
