use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::bluetooth::{ADVERTISING_UUID, DEFAULT_PAUSE_WINDOW_MS, DEFAULT_SCAN_WINDOW_MS};
use crate::error::ConfigError;

/// Scan duty cycle settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// How long each scan window stays open, in milliseconds.
    pub scan_window_ms: u64,
    /// How long to pause between scan windows, in milliseconds.
    pub pause_window_ms: u64,
    /// Only report peripherals advertising the SensorTag identifier (AA10).
    /// Turn this off for firmware that doesn't advertise it.
    pub filter_by_advertised_service: bool,
    /// Start searching as soon as the radio becomes available.
    pub scan_on_power_on: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            scan_window_ms: DEFAULT_SCAN_WINDOW_MS,
            pause_window_ms: DEFAULT_PAUSE_WINDOW_MS,
            filter_by_advertised_service: true,
            scan_on_power_on: true,
        }
    }
}

impl ScanConfig {
    pub fn scan_window(&self) -> Result<Duration, ConfigError> {
        non_zero(self.scan_window_ms)
    }

    pub fn pause_window(&self) -> Result<Duration, ConfigError> {
        non_zero(self.pause_window_ms)
    }

    pub fn scan_filter(&self) -> Vec<uuid::Uuid> {
        if self.filter_by_advertised_service {
            vec![ADVERTISING_UUID]
        } else {
            Vec::new()
        }
    }
}

fn non_zero(ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::ZeroWindow);
    }
    Ok(Duration::from_millis(ms))
}
