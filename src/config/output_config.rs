use serde::{Deserialize, Serialize};

/// How readings are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable log lines
    #[default]
    Log,
    /// One JSON object per event on stdout
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Log filter, e.g. "info" or "sensortag_bridge_lib=debug". `RUST_LOG`
    /// takes precedence.
    pub level: String,
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            level: "info".to_string(),
            format: OutputFormat::Log,
        }
    }
}
