//! Core functionality for the SensorTag bridge
//! This module contains the BLE plumbing and the sample decoder.

pub mod bluetooth;
pub mod codec;

// Re-export commonly used types
pub use bluetooth::{BluestTransport, SensorManager};
pub use codec::{HumiditySample, TemperatureSample};
