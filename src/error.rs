//! Error types shared across the bridge.
//!
//! [`ErrorKind`] is what the reading sink sees; the `thiserror` enums carry
//! the detail for the codec, the transport adapter and configuration.

use serde::Serialize;
use thiserror::Error;

use crate::core::bluetooth::{CharacteristicRef, PeripheralId, ServiceRef};

/// Classification of failures reported through [`ReadingSink::on_error`].
///
/// [`ReadingSink::on_error`]: crate::core::bluetooth::ReadingSink::on_error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Radio off, unsupported or unauthorized. Nothing happens until the
    /// radio becomes available again.
    TransportUnavailable,
    /// The connect attempt failed. A new scan may find the peripheral again.
    ConnectFailed,
    /// Service or characteristic discovery failed.
    DiscoveryFailed,
    /// Enabling notifications or writing the sensor enable flag failed for
    /// one channel.
    ConfigurationFailed,
    /// A notification payload was too short to decode.
    MalformedPayload,
    /// The link dropped without a disconnect request.
    UnexpectedDisconnect,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::TransportUnavailable => "transport unavailable",
            Self::ConnectFailed => "connect failed",
            Self::DiscoveryFailed => "discovery failed",
            Self::ConfigurationFailed => "configuration failed",
            Self::MalformedPayload => "malformed payload",
            Self::UnexpectedDisconnect => "unexpected disconnect",
        };
        f.write_str(name)
    }
}

/// Decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed payload: expected at least {expected} bytes, got {actual}")]
    MalformedPayload { expected: usize, actual: usize },
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedPayload { .. } => ErrorKind::MalformedPayload,
        }
    }
}

/// Failures raised by the bluest-backed transport before a command is issued.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no Bluetooth adapter found")]
    NoAdapter,
    #[error("unknown peripheral {0}")]
    UnknownPeripheral(PeripheralId),
    #[error("unknown service {} on {}", .0.uuid, .0.peripheral)]
    UnknownService(ServiceRef),
    #[error("unknown characteristic {} on {}", .0.uuid, .0.peripheral)]
    UnknownCharacteristic(CharacteristicRef),
    #[error(transparent)]
    Bluetooth(#[from] bluest::Error),
}

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid device name pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("scan window and pause window must be non-zero")]
    ZeroWindow,
}
