//! Sensor manager for the SensorTag bridge
//! This module drives the connection state machine: it owns the event inbox,
//! hands transport commands to a [`BleTransport`], runs the scan timer and
//! forwards readings to a [`ReadingSink`].

use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::commands::ReaderHandle;
use crate::core::bluetooth::commands::{BleTransport, TransportCommand};
use crate::core::bluetooth::connection::{ConnectionMachine, ConnectionState, Effect, MachineConfig};
use crate::core::bluetooth::notification::ReadingSink;
use crate::core::bluetooth::scanner::TimerToken;
use crate::core::bluetooth::types::Event;

pub type EventSender = mpsc::UnboundedSender<Event>;
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Creates the inbox shared by the transport, the timer and user requests.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Serializes every event through the connection state machine
pub struct SensorManager<T: BleTransport, S: ReadingSink> {
    machine: ConnectionMachine,
    transport: T,
    sink: S,
    events_tx: EventSender,
    events_rx: EventReceiver,
    /// Cancels the pending scan timer
    timer: Option<CancellationToken>,
    shutdown: CancellationToken,
}

impl<T: BleTransport, S: ReadingSink> SensorManager<T, S> {
    /// Creates a new SensorManager. `events_tx` must feed `events_rx`; the
    /// transport usually holds another clone of it.
    pub fn new(
        config: MachineConfig,
        transport: T,
        sink: S,
        events_tx: EventSender,
        events_rx: EventReceiver,
    ) -> Self {
        Self {
            machine: ConnectionMachine::new(config),
            transport,
            sink,
            events_tx,
            events_rx,
            timer: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Returns a handle for issuing connect/disconnect requests.
    pub fn handle(&self) -> ReaderHandle {
        ReaderHandle::new(self.events_tx.clone(), self.shutdown.clone())
    }

    pub fn state(&self) -> &ConnectionState {
        self.machine.state()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Processes events until shutdown is requested.
    pub async fn run(&mut self) {
        info!("Sensor manager started.");
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested.");
                    break;
                }
                event = self.events_rx.recv() => {
                    match event {
                        Some(event) => self.dispatch(event).await,
                        None => {
                            info!("Event inbox closed.");
                            break;
                        }
                    }
                }
            }
        }
        self.cancel_timer();
        info!("Sensor manager stopped.");
    }

    /// Runs one event through the state machine and carries out its effects.
    pub async fn dispatch(&mut self, event: Event) {
        debug!("Handling {:?}", event);
        for effect in self.machine.handle(event) {
            self.apply(effect).await;
        }
    }

    async fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Transport(command) => self.execute(command).await,
            Effect::ArmTimer { after, token } => self.arm_timer(after, token),
            Effect::CancelTimer => self.cancel_timer(),
            Effect::Sink(event) => self.sink.deliver(event),
        }
    }

    async fn execute(&mut self, command: TransportCommand) {
        debug!("Issuing {:?}", command);
        if let Err(e) = self.transport.execute(&command).await {
            warn!("Transport rejected {:?}: {:#}", command, e);
            // the state machine still waits for an outcome
            if let Some(event) = command.failure_event(&e) {
                self.post(event.into());
            }
        }
    }

    fn arm_timer(&mut self, after: Duration, token: TimerToken) {
        self.cancel_timer();

        let cancel_token = CancellationToken::new();
        let cancel_token_for_task = cancel_token.clone();
        let events_tx = self.events_tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(after) => {
                    if events_tx.send(Event::ScanTimer(token)).is_err() {
                        debug!("Scan timer {:?} fired after shutdown.", token);
                    }
                }
                _ = cancel_token_for_task.cancelled() => {}
            }
        });

        self.timer = Some(cancel_token);
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    fn post(&self, event: Event) {
        if self.events_tx.send(event).is_err() {
            warn!("Event inbox closed, dropping event.");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::{Result, anyhow};
    use uuid::Uuid;

    use super::*;
    use crate::core::bluetooth::connection::Lifecycle;
    use crate::core::bluetooth::constants::ADVERTISING_UUID;
    use crate::core::bluetooth::notification::{ChannelSink, SinkEvent};
    use crate::core::bluetooth::types::{
        CharacteristicRef, PeripheralId, RadioState, ServiceRef, TransportEvent, UserRequest,
    };
    use crate::error::ErrorKind;

    /// Records commands without ever answering them
    #[derive(Clone, Default)]
    struct RecordingTransport {
        issued: Arc<Mutex<Vec<TransportCommand>>>,
        reject_connect: bool,
    }

    impl RecordingTransport {
        fn record(&self, command: TransportCommand) -> Result<()> {
            self.issued.lock().unwrap().push(command);
            Ok(())
        }

        fn issued(&self) -> Vec<TransportCommand> {
            self.issued.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl BleTransport for RecordingTransport {
        async fn start_scan(&mut self, filter: &[Uuid]) -> Result<()> {
            self.record(TransportCommand::StartScan {
                filter: filter.to_vec(),
            })
        }

        async fn stop_scan(&mut self) -> Result<()> {
            self.record(TransportCommand::StopScan)
        }

        async fn connect(&mut self, peripheral: &PeripheralId) -> Result<()> {
            self.record(TransportCommand::Connect(peripheral.clone()))?;
            if self.reject_connect {
                return Err(anyhow!("peripheral gone"));
            }
            Ok(())
        }

        async fn disconnect(&mut self, peripheral: &PeripheralId) -> Result<()> {
            self.record(TransportCommand::Disconnect(peripheral.clone()))
        }

        async fn discover_services(&mut self, peripheral: &PeripheralId) -> Result<()> {
            self.record(TransportCommand::DiscoverServices(peripheral.clone()))
        }

        async fn discover_characteristics(&mut self, service: &ServiceRef) -> Result<()> {
            self.record(TransportCommand::DiscoverCharacteristics(service.clone()))
        }

        async fn set_notify(&mut self, characteristic: &CharacteristicRef, enabled: bool) -> Result<()> {
            self.record(TransportCommand::SetNotify {
                characteristic: characteristic.clone(),
                enabled,
            })
        }

        async fn write_value(&mut self, characteristic: &CharacteristicRef, value: &[u8]) -> Result<()> {
            self.record(TransportCommand::WriteValue {
                characteristic: characteristic.clone(),
                value: value.to_vec(),
            })
        }
    }

    fn manager(
        transport: RecordingTransport,
    ) -> (
        SensorManager<RecordingTransport, ChannelSink>,
        mpsc::UnboundedReceiver<SinkEvent>,
    ) {
        let (sink, readings) = ChannelSink::new();
        let (tx, rx) = event_channel();
        let manager = SensorManager::new(MachineConfig::default(), transport, sink, tx, rx);
        (manager, readings)
    }

    fn lifecycle(state: Lifecycle) -> SinkEvent {
        SinkEvent::LifecycleChanged { state }
    }

    #[tokio::test(start_paused = true)]
    async fn scan_window_closes_when_timer_fires() {
        let transport = RecordingTransport::default();
        let (mut manager, _readings) = manager(transport.clone());
        let handle = manager.handle();
        manager
            .events_tx
            .send(TransportEvent::AdapterStateChanged(RadioState::PoweredOn).into())
            .unwrap();

        let task = tokio::spawn(async move {
            manager.run().await;
            manager
        });

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(
            transport.issued(),
            vec![
                TransportCommand::StartScan {
                    filter: vec![ADVERTISING_UUID]
                },
                TransportCommand::StopScan,
            ]
        );

        // pause window of 10 s, then scanning resumes
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.issued().len(), 3);

        handle.shutdown();
        let manager = task.await.unwrap();
        assert_eq!(manager.state().lifecycle(), Lifecycle::Scanning);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_connect_is_fed_back_as_failure() {
        let transport = RecordingTransport {
            reject_connect: true,
            ..RecordingTransport::default()
        };
        let (mut manager, mut readings) = manager(transport);

        manager
            .dispatch(TransportEvent::AdapterStateChanged(RadioState::PoweredOn).into())
            .await;
        manager
            .dispatch(
                TransportEvent::PeripheralDiscovered {
                    peripheral: PeripheralId::new("tag-1"),
                    name: Some("CC2650 SensorTag".to_string()),
                    rssi: Some(-55),
                }
                .into(),
            )
            .await;

        // the synthesized ConnectFailed sits in the inbox
        let event = manager.events_rx.recv().await.unwrap();
        manager.dispatch(event).await;

        let mut delivered = Vec::new();
        while let Ok(event) = readings.try_recv() {
            delivered.push(event);
        }
        assert_eq!(delivered[0], lifecycle(Lifecycle::Scanning));
        assert_eq!(delivered[1], lifecycle(Lifecycle::Connecting));
        assert!(matches!(
            delivered[2],
            SinkEvent::Error {
                kind: ErrorKind::ConnectFailed,
                ..
            }
        ));
        assert_eq!(&delivered[3..], &[lifecycle(Lifecycle::Idle), lifecycle(Lifecycle::Scanning)]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let transport = RecordingTransport::default();
        let (mut manager, _readings) = manager(transport.clone());

        manager
            .dispatch(TransportEvent::AdapterStateChanged(RadioState::PoweredOn).into())
            .await;
        manager.dispatch(UserRequest::Disconnect.into()).await;
        assert_eq!(manager.state().lifecycle(), Lifecycle::Idle);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(manager.events_rx.try_recv().is_err());
        assert_eq!(
            transport.issued(),
            vec![
                TransportCommand::StartScan {
                    filter: vec![ADVERTISING_UUID]
                },
                TransportCommand::StopScan,
            ]
        );
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let (sink, _readings) = ChannelSink::new();
        let (tx, rx) = event_channel();
        let mut manager =
            SensorManager::new(MachineConfig::default(), RecordingTransport::default(), sink, tx, rx);
        let handle = manager.handle();
        handle.shutdown();
        manager.run().await;
        assert_eq!(manager.state().lifecycle(), Lifecycle::Idle);
    }
}
