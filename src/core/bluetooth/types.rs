//! Defines shared data structures for the Bluetooth module.
//!
//! Handles are plain values naming a peripheral, a service on it, or a
//! characteristic within a service. The transport adapter maps them back to
//! its own objects; the state machine only compares them.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::core::bluetooth::scanner::TimerToken;

/// Platform-specific identifier of a discovered peripheral
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PeripheralId(pub String);

impl PeripheralId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A service on a peripheral
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceRef {
    pub peripheral: PeripheralId,
    pub uuid: Uuid,
}

impl ServiceRef {
    pub fn new(peripheral: PeripheralId, uuid: Uuid) -> Self {
        Self { peripheral, uuid }
    }
}

/// A characteristic within a service on a peripheral
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharacteristicRef {
    pub peripheral: PeripheralId,
    pub service: Uuid,
    pub uuid: Uuid,
}

impl CharacteristicRef {
    pub fn new(service: &ServiceRef, uuid: Uuid) -> Self {
        Self {
            peripheral: service.peripheral.clone(),
            service: service.uuid,
            uuid,
        }
    }
}

/// Power/authorization state of the local radio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RadioState {
    #[default]
    Unknown,
    Resetting,
    Unsupported,
    Unauthorized,
    PoweredOff,
    PoweredOn,
}

impl RadioState {
    /// Human-readable explanation shown when the radio can't be used.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::PoweredOff => "Bluetooth on this device is currently powered off.",
            Self::Unsupported => "This device does not support Bluetooth Low Energy.",
            Self::Unauthorized => "This app is not authorized to use Bluetooth Low Energy.",
            Self::Resetting => "The BLE Manager is resetting; a state update is pending.",
            Self::Unknown => "The state of the BLE Manager is unknown.",
            Self::PoweredOn => "Bluetooth LE is turned on and ready for communication.",
        }
    }

    /// States the radio can't leave without outside help.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unsupported | Self::Unauthorized | Self::PoweredOff)
    }
}

/// Events delivered asynchronously by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    AdapterStateChanged(RadioState),
    PeripheralDiscovered {
        peripheral: PeripheralId,
        name: Option<String>,
        rssi: Option<i16>,
    },
    Connected {
        peripheral: PeripheralId,
    },
    ConnectFailed {
        peripheral: PeripheralId,
        error: Option<String>,
    },
    Disconnected {
        peripheral: PeripheralId,
        error: Option<String>,
    },
    ServicesDiscovered {
        peripheral: PeripheralId,
        result: Result<Vec<ServiceRef>, String>,
    },
    CharacteristicsDiscovered {
        service: ServiceRef,
        result: Result<Vec<CharacteristicRef>, String>,
    },
    /// Outcome of a `set_notify` request; `Ok(true)` confirms a subscription.
    NotifyStateChanged {
        characteristic: CharacteristicRef,
        result: Result<bool, String>,
    },
    ValueWritten {
        characteristic: CharacteristicRef,
        result: Result<(), String>,
    },
    ValueUpdated {
        characteristic: CharacteristicRef,
        result: Result<Vec<u8>, String>,
    },
}

/// Requests from the user of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRequest {
    Connect,
    Disconnect,
}

/// Everything the connection state machine reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    User(UserRequest),
    ScanTimer(TimerToken),
    Transport(TransportEvent),
}

impl From<TransportEvent> for Event {
    fn from(event: TransportEvent) -> Self {
        Self::Transport(event)
    }
}

impl From<UserRequest> for Event {
    fn from(request: UserRequest) -> Self {
        Self::User(request)
    }
}
