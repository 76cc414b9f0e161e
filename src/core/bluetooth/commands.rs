//! Commands issued to the BLE transport
//! The transport only issues a command; its outcome comes back later as a
//! [`TransportEvent`].

use anyhow::Result;
use uuid::Uuid;

use crate::core::bluetooth::constants::SENSOR_ENABLE_VALUE;
use crate::core::bluetooth::types::{CharacteristicRef, PeripheralId, ServiceRef, TransportEvent};

/// Transport commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    /// Scan for peripherals advertising any of `filter` (all if empty)
    StartScan { filter: Vec<Uuid> },
    StopScan,
    Connect(PeripheralId),
    Disconnect(PeripheralId),
    DiscoverServices(PeripheralId),
    DiscoverCharacteristics(ServiceRef),
    SetNotify {
        characteristic: CharacteristicRef,
        enabled: bool,
    },
    WriteValue {
        characteristic: CharacteristicRef,
        value: Vec<u8>,
    },
}

impl TransportCommand {
    /// The one-byte write that switches a sensor on
    pub fn enable_sensor(characteristic: CharacteristicRef) -> Self {
        Self::WriteValue {
            characteristic,
            value: vec![SENSOR_ENABLE_VALUE],
        }
    }

    /// The event reporting that this command could not be issued at all, if
    /// the state machine waits for one.
    pub fn failure_event(&self, error: &anyhow::Error) -> Option<TransportEvent> {
        let error = error.to_string();
        match self {
            Self::Connect(peripheral) => Some(TransportEvent::ConnectFailed {
                peripheral: peripheral.clone(),
                error: Some(error),
            }),
            Self::Disconnect(peripheral) => Some(TransportEvent::Disconnected {
                peripheral: peripheral.clone(),
                error: Some(error),
            }),
            Self::DiscoverServices(peripheral) => Some(TransportEvent::ServicesDiscovered {
                peripheral: peripheral.clone(),
                result: Err(error),
            }),
            Self::DiscoverCharacteristics(service) => {
                Some(TransportEvent::CharacteristicsDiscovered {
                    service: service.clone(),
                    result: Err(error),
                })
            }
            Self::SetNotify {
                characteristic,
                enabled: true,
            } => Some(TransportEvent::NotifyStateChanged {
                characteristic: characteristic.clone(),
                result: Err(error),
            }),
            Self::WriteValue { characteristic, .. } => Some(TransportEvent::ValueWritten {
                characteristic: characteristic.clone(),
                result: Err(error),
            }),
            Self::StartScan { .. } | Self::StopScan | Self::SetNotify { enabled: false, .. } => {
                None
            }
        }
    }
}

/// Abstract BLE transport.
///
/// Every method returns once the command is issued and must not wait for the
/// radio. An `Err` means the command was rejected outright.
#[async_trait::async_trait]
pub trait BleTransport: Send {
    async fn start_scan(&mut self, filter: &[Uuid]) -> Result<()>;

    async fn stop_scan(&mut self) -> Result<()>;

    async fn connect(&mut self, peripheral: &PeripheralId) -> Result<()>;

    async fn disconnect(&mut self, peripheral: &PeripheralId) -> Result<()>;

    async fn discover_services(&mut self, peripheral: &PeripheralId) -> Result<()>;

    async fn discover_characteristics(&mut self, service: &ServiceRef) -> Result<()>;

    async fn set_notify(&mut self, characteristic: &CharacteristicRef, enabled: bool) -> Result<()>;

    async fn write_value(&mut self, characteristic: &CharacteristicRef, value: &[u8]) -> Result<()>;

    /// Dispatches a command to the matching method.
    async fn execute(&mut self, command: &TransportCommand) -> Result<()> {
        match command {
            TransportCommand::StartScan { filter } => self.start_scan(filter).await,
            TransportCommand::StopScan => self.stop_scan().await,
            TransportCommand::Connect(peripheral) => self.connect(peripheral).await,
            TransportCommand::Disconnect(peripheral) => self.disconnect(peripheral).await,
            TransportCommand::DiscoverServices(peripheral) => {
                self.discover_services(peripheral).await
            }
            TransportCommand::DiscoverCharacteristics(service) => {
                self.discover_characteristics(service).await
            }
            TransportCommand::SetNotify {
                characteristic,
                enabled,
            } => self.set_notify(characteristic, *enabled).await,
            TransportCommand::WriteValue {
                characteristic,
                value,
            } => self.write_value(characteristic, value).await,
        }
    }
}
