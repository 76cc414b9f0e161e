//! Delivery of decoded readings and lifecycle changes
//! The connection state machine emits [`SinkEvent`]s; the manager hands them
//! to a [`ReadingSink`] owned by whatever presents the data.

use std::io::Write;

use log::{error, info, warn};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::core::bluetooth::connection::Lifecycle;
use crate::error::ErrorKind;

/// Notifications produced by the state machine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SinkEvent {
    LifecycleChanged { state: Lifecycle },
    Temperature { fahrenheit: i32 },
    Humidity { percent: f64 },
    Error { kind: ErrorKind, message: String },
}

/// Consumer of readings and lifecycle changes
pub trait ReadingSink: Send {
    fn on_lifecycle_changed(&mut self, state: Lifecycle);

    fn on_temperature_reading(&mut self, fahrenheit: i32);

    fn on_humidity_reading(&mut self, percent: f64);

    fn on_error(&mut self, kind: ErrorKind, message: &str);

    fn deliver(&mut self, event: SinkEvent) {
        match event {
            SinkEvent::LifecycleChanged { state } => self.on_lifecycle_changed(state),
            SinkEvent::Temperature { fahrenheit } => self.on_temperature_reading(fahrenheit),
            SinkEvent::Humidity { percent } => self.on_humidity_reading(percent),
            SinkEvent::Error { kind, message } => self.on_error(kind, &message),
        }
    }
}

/// Writes readings to the log
#[derive(Debug, Default)]
pub struct LogSink;

impl ReadingSink for LogSink {
    fn on_lifecycle_changed(&mut self, state: Lifecycle) {
        info!("SensorTag {}", state);
    }

    fn on_temperature_reading(&mut self, fahrenheit: i32) {
        info!("Temperature: {}°", fahrenheit);
    }

    fn on_humidity_reading(&mut self, percent: f64) {
        info!("Humidity: {:.1}%", percent);
    }

    fn on_error(&mut self, kind: ErrorKind, message: &str) {
        match kind {
            ErrorKind::MalformedPayload | ErrorKind::ConfigurationFailed => {
                warn!("{}: {}", kind, message)
            }
            _ => error!("{}: {}", kind, message),
        }
    }
}

/// Writes one JSON object per event to stdout
#[derive(Debug, Default)]
pub struct JsonSink;

impl JsonSink {
    fn emit(&self, event: &SinkEvent) {
        match serde_json::to_string(event) {
            Ok(line) => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = writeln!(stdout, "{}", line) {
                    error!("Failed to write event: {}", e);
                }
            }
            Err(e) => error!("Failed to serialize event {:?}: {}", event, e),
        }
    }
}

impl ReadingSink for JsonSink {
    fn on_lifecycle_changed(&mut self, state: Lifecycle) {
        self.emit(&SinkEvent::LifecycleChanged { state });
    }

    fn on_temperature_reading(&mut self, fahrenheit: i32) {
        self.emit(&SinkEvent::Temperature { fahrenheit });
    }

    fn on_humidity_reading(&mut self, percent: f64) {
        self.emit(&SinkEvent::Humidity { percent });
    }

    fn on_error(&mut self, kind: ErrorKind, message: &str) {
        self.emit(&SinkEvent::Error {
            kind,
            message: message.to_string(),
        });
    }
}

/// Forwards events to a channel, for embedding the bridge in another task
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<SinkEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn send(&self, event: SinkEvent) {
        if self.sender.send(event).is_err() {
            warn!("Reading receiver dropped, event discarded.");
        }
    }
}

impl ReadingSink for ChannelSink {
    fn on_lifecycle_changed(&mut self, state: Lifecycle) {
        self.send(SinkEvent::LifecycleChanged { state });
    }

    fn on_temperature_reading(&mut self, fahrenheit: i32) {
        self.send(SinkEvent::Temperature { fahrenheit });
    }

    fn on_humidity_reading(&mut self, percent: f64) {
        self.send(SinkEvent::Humidity { percent });
    }

    fn on_error(&mut self, kind: ErrorKind, message: &str) {
        self.send(SinkEvent::Error {
            kind,
            message: message.to_string(),
        });
    }
}
