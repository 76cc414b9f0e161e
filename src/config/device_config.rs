use serde::{Deserialize, Serialize};

use crate::core::bluetooth::{ChannelPolicy, DeviceMatcher, NameMatch, SENSOR_TAG_NAME};
use crate::error::ConfigError;

/// Which peripheral to connect to and what it must provide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Advertised name, substring or regular expression, see `name_match`.
    pub name: String,
    pub name_match: NameMatch,
    /// Candidates advertising a weaker signal (dBm) are skipped.
    pub min_rssi: Option<i16>,
    pub channel_policy: ChannelPolicy,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            name: SENSOR_TAG_NAME.to_string(),
            name_match: NameMatch::Exact,
            min_rssi: None,
            channel_policy: ChannelPolicy::AnyDiscovered,
        }
    }
}

impl DeviceConfig {
    pub fn matcher(&self) -> Result<DeviceMatcher, ConfigError> {
        DeviceMatcher::new(self.name.clone(), self.name_match)
    }
}
