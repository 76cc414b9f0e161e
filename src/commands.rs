//! User-facing commands
//! This module defines the requests a front end can issue to a running
//! [`SensorManager`](crate::core::bluetooth::SensorManager).

use anyhow::{Result, anyhow};
use log::info;
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::{Event, EventSender, UserRequest};

/// Cloneable handle to a running sensor manager
#[derive(Debug, Clone)]
pub struct ReaderHandle {
    events: EventSender,
    shutdown: CancellationToken,
}

impl ReaderHandle {
    pub fn new(events: EventSender, shutdown: CancellationToken) -> Self {
        Self { events, shutdown }
    }

    /// Starts looking for a SensorTag and keeps looking until one streams.
    ///
    /// If the radio is not powered on yet, the search starts once it is.
    pub fn connect(&self) -> Result<()> {
        info!("Connect requested.");
        self.send(UserRequest::Connect.into())
    }

    /// Stops scanning, or unsubscribes and disconnects from the current
    /// SensorTag.
    pub fn disconnect(&self) -> Result<()> {
        info!("Disconnect requested.");
        self.send(UserRequest::Disconnect.into())
    }

    /// Stops the manager's event loop.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn send(&self, event: Event) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| anyhow!("Sensor manager is no longer running"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bluetooth::event_channel;

    #[test]
    fn requests_reach_the_inbox() {
        let (tx, mut rx) = event_channel();
        let handle = ReaderHandle::new(tx, CancellationToken::new());

        handle.connect().unwrap();
        handle.disconnect().unwrap();
        assert_eq!(rx.try_recv().unwrap(), Event::User(UserRequest::Connect));
        assert_eq!(rx.try_recv().unwrap(), Event::User(UserRequest::Disconnect));
    }

    #[test]
    fn requests_fail_once_the_manager_is_gone() {
        let (tx, rx) = event_channel();
        let handle = ReaderHandle::new(tx, CancellationToken::new());
        drop(rx);
        assert!(handle.connect().is_err());
    }

    #[test]
    fn shutdown_is_shared_between_clones() {
        let (tx, _rx) = event_channel();
        let handle = ReaderHandle::new(tx, CancellationToken::new());
        let clone = handle.clone();
        clone.shutdown();
        assert!(handle.is_shut_down());
    }
}
