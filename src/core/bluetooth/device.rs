//! Matching discovered peripherals against the configured SensorTag name

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::bluetooth::constants::SENSOR_TAG_NAME;
use crate::error::ConfigError;

/// How an advertised name is compared with the configured device name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatch {
    /// The advertised name must equal the configured name.
    #[default]
    Exact,
    /// The advertised name must contain the configured name, e.g. "SensorTag"
    /// matches every hardware revision.
    Contains,
    /// The configured name is a regular expression.
    Pattern,
}

/// Decides whether a discovered peripheral is the one we want
#[derive(Debug, Clone)]
pub struct DeviceMatcher {
    name: String,
    mode: NameMatch,
    pattern: Option<Regex>,
}

impl DeviceMatcher {
    pub fn new(name: impl Into<String>, mode: NameMatch) -> Result<Self, ConfigError> {
        let name = name.into();
        let pattern = match mode {
            NameMatch::Pattern => Some(Regex::new(&name).map_err(|source| {
                ConfigError::InvalidPattern {
                    pattern: name.clone(),
                    source,
                }
            })?),
            NameMatch::Exact | NameMatch::Contains => None,
        };
        Ok(Self { name, mode, pattern })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> NameMatch {
        self.mode
    }

    /// Returns true if the advertised name identifies a supported SensorTag.
    /// Peripherals that don't advertise a name never match.
    pub fn matches(&self, advertised: Option<&str>) -> bool {
        let Some(advertised) = advertised else {
            return false;
        };
        match (&self.mode, &self.pattern) {
            (NameMatch::Exact, _) => advertised == self.name,
            (NameMatch::Contains, _) => advertised.contains(self.name.as_str()),
            (NameMatch::Pattern, Some(pattern)) => pattern.is_match(advertised),
            (NameMatch::Pattern, None) => false,
        }
    }
}

impl Default for DeviceMatcher {
    fn default() -> Self {
        Self {
            name: SENSOR_TAG_NAME.to_string(),
            mode: NameMatch::Exact,
            pattern: None,
        }
    }
}
