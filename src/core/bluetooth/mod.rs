//! Bluetooth functionality for the SensorTag bridge
//! This module handles all bluetooth operations including scanning,
//! connecting, and receiving readings from the SensorTag.

mod commands;
mod connection;
mod constants;
mod device;
mod manager;
mod notification;
mod scanner;
mod bluest_transport;
mod types;

// Re-export types that should be publicly accessible
pub use commands::{BleTransport, TransportCommand};
pub use connection::{
    ChannelPolicy, ConnectionMachine, ConnectionState, Effect, Lifecycle, MachineConfig,
    handle_event,
};
pub use constants::*; // Re-export all constants
pub use device::{DeviceMatcher, NameMatch};
pub use manager::{EventReceiver, EventSender, SensorManager, event_channel};
pub use notification::{ChannelSink, JsonSink, LogSink, ReadingSink, SinkEvent};
pub use scanner::{ScanAction, ScanPhase, ScanScheduler, TimerToken};
pub use bluest_transport::BluestTransport;
pub use types::{
    CharacteristicRef, Event, PeripheralId, RadioState, ServiceRef, TransportEvent, UserRequest,
};
