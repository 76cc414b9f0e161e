//! SensorTag bridge library
//! Finds a TI CC2650 SensorTag over Bluetooth LE, subscribes to its
//! temperature and humidity services and delivers calibrated readings to a
//! [`ReadingSink`](core::bluetooth::ReadingSink).

// Module declarations
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod utils;

pub use commands::ReaderHandle;
pub use config::AppConfig;
