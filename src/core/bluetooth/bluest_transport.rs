//! bluest-backed implementation of [`BleTransport`]
//! Every command is issued on a spawned task; its outcome is posted back to
//! the manager's inbox as a [`TransportEvent`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bluest::{Adapter, AdapterEvent, Characteristic, Device, Service};
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::bluetooth::commands::BleTransport;
use crate::core::bluetooth::constants::LINK_POLL_INTERVAL_MS;
use crate::core::bluetooth::manager::EventSender;
use crate::core::bluetooth::types::{
    CharacteristicRef, PeripheralId, RadioState, ServiceRef, TransportEvent,
};
use crate::error::TransportError;

/// bluest objects behind the handles given to the state machine
#[derive(Default)]
struct Registry {
    devices: HashMap<PeripheralId, Device>,
    services: HashMap<ServiceRef, Service>,
    characteristics: HashMap<CharacteristicRef, Characteristic>,
    /// Cancels the notification task of a subscribed characteristic
    subscriptions: HashMap<CharacteristicRef, CancellationToken>,
    /// Cancels the link watcher of a connected peripheral
    links: HashMap<PeripheralId, CancellationToken>,
}

impl Registry {
    /// Drops every handle that belongs to `peripheral` and stops its tasks.
    fn forget(&mut self, peripheral: &PeripheralId) {
        if let Some(link) = self.links.remove(peripheral) {
            link.cancel();
        }
        self.subscriptions.retain(|characteristic, token| {
            if characteristic.peripheral == *peripheral {
                token.cancel();
                false
            } else {
                true
            }
        });
        self.characteristics
            .retain(|characteristic, _| characteristic.peripheral != *peripheral);
        self.services.retain(|service, _| service.peripheral != *peripheral);
    }
}

pub struct BluestTransport {
    adapter: Adapter,
    events: EventSender,
    registry: Arc<Mutex<Registry>>,
    scan_cancel: Option<CancellationToken>,
    adapter_watch: CancellationToken,
}

impl BluestTransport {
    /// Opens the default adapter and starts reporting its state to `events`.
    pub async fn new(events: EventSender) -> Result<Self> {
        let adapter = Adapter::default().await.ok_or(TransportError::NoAdapter)?;
        info!("Bluetooth adapter found.");

        let transport = Self {
            adapter,
            events,
            registry: Arc::new(Mutex::new(Registry::default())),
            scan_cancel: None,
            adapter_watch: CancellationToken::new(),
        };
        transport.watch_adapter();
        Ok(transport)
    }

    fn watch_adapter(&self) {
        let adapter = self.adapter.clone();
        let events = self.events.clone();
        let cancel_token = self.adapter_watch.clone();

        tokio::spawn(async move {
            let initial = match adapter.is_available().await {
                Ok(true) => RadioState::PoweredOn,
                Ok(false) => RadioState::PoweredOff,
                Err(e) => {
                    warn!("Failed to query adapter state: {}", e);
                    RadioState::Unknown
                }
            };
            post(&events, TransportEvent::AdapterStateChanged(initial));

            let mut adapter_events = match adapter.events().await {
                Ok(stream) => stream,
                Err(e) => {
                    error!("Failed to watch adapter state: {}", e);
                    return;
                }
            };
            loop {
                tokio::select! {
                    event = adapter_events.next() => {
                        let state = match event {
                            Some(Ok(AdapterEvent::Available)) => RadioState::PoweredOn,
                            Some(Ok(AdapterEvent::Unavailable)) => RadioState::PoweredOff,
                            Some(Err(e)) => {
                                warn!("Adapter event error: {}", e);
                                continue;
                            }
                            None => {
                                info!("Adapter event stream has ended.");
                                break;
                            }
                        };
                        post(&events, TransportEvent::AdapterStateChanged(state));
                    }
                    _ = cancel_token.cancelled() => break,
                }
            }
        });
    }

    async fn device(&self, peripheral: &PeripheralId) -> Result<Device, TransportError> {
        self.registry
            .lock()
            .await
            .devices
            .get(peripheral)
            .cloned()
            .ok_or_else(|| TransportError::UnknownPeripheral(peripheral.clone()))
    }

    async fn characteristic(
        &self,
        characteristic: &CharacteristicRef,
    ) -> Result<Characteristic, TransportError> {
        self.registry
            .lock()
            .await
            .characteristics
            .get(characteristic)
            .cloned()
            .ok_or_else(|| TransportError::UnknownCharacteristic(characteristic.clone()))
    }

    /// Polls the link and reports a drop the state machine didn't ask for.
    fn watch_link(device: Device, peripheral: PeripheralId, events: EventSender, cancel_token: CancellationToken) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(LINK_POLL_INTERVAL_MS));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if !device.is_connected().await {
                            info!("Device {} lost connection.", peripheral);
                            post(&events, TransportEvent::Disconnected {
                                peripheral,
                                error: Some("link lost".to_string()),
                            });
                            break;
                        }
                    }
                    _ = cancel_token.cancelled() => break,
                }
            }
        });
    }
}

impl Drop for BluestTransport {
    fn drop(&mut self) {
        self.adapter_watch.cancel();
        if let Some(scan) = self.scan_cancel.take() {
            scan.cancel();
        }
    }
}

#[async_trait::async_trait]
impl BleTransport for BluestTransport {
    async fn start_scan(&mut self, filter: &[Uuid]) -> Result<()> {
        if let Some(previous) = self.scan_cancel.take() {
            previous.cancel();
        }
        let cancel_token = CancellationToken::new();
        self.scan_cancel = Some(cancel_token.clone());

        let adapter = self.adapter.clone();
        let events = self.events.clone();
        let registry = self.registry.clone();
        let filter = filter.to_vec();

        tokio::spawn(async move {
            let mut scan_stream = match adapter.scan(&filter).await {
                Ok(stream) => stream,
                Err(e) => {
                    error!("Failed to start bluetooth scan: {}", e);
                    return;
                }
            };
            info!("Bluetooth scan started.");

            loop {
                tokio::select! {
                    result = scan_stream.next() => {
                        let Some(found) = result else {
                            info!("Bluetooth scan stream has ended.");
                            break;
                        };
                        let peripheral = PeripheralId::new(found.device.id().to_string());
                        let name = found
                            .adv_data
                            .local_name
                            .clone()
                            .or_else(|| found.device.name().ok());
                        debug!("Found device - ID: {}, Name: {:?}, RSSI: {:?}", peripheral, name, found.rssi);

                        registry
                            .lock()
                            .await
                            .devices
                            .insert(peripheral.clone(), found.device);
                        post(&events, TransportEvent::PeripheralDiscovered {
                            peripheral,
                            name,
                            rssi: found.rssi,
                        });
                    }
                    _ = cancel_token.cancelled() => {
                        info!("Bluetooth scan stopped.");
                        break;
                    }
                }
            }
        });
        Ok(())
    }

    async fn stop_scan(&mut self) -> Result<()> {
        if let Some(scan) = self.scan_cancel.take() {
            scan.cancel();
        }
        Ok(())
    }

    async fn connect(&mut self, peripheral: &PeripheralId) -> Result<()> {
        let device = self.device(peripheral).await?;
        let link_token = CancellationToken::new();
        if let Some(previous) = self
            .registry
            .lock()
            .await
            .links
            .insert(peripheral.clone(), link_token.clone())
        {
            previous.cancel();
        }

        let adapter = self.adapter.clone();
        let events = self.events.clone();
        let peripheral = peripheral.clone();

        tokio::spawn(async move {
            info!("Initiating connection to {}...", peripheral);
            match adapter.connect_device(&device).await {
                Ok(()) => {
                    post(&events, TransportEvent::Connected {
                        peripheral: peripheral.clone(),
                    });
                    Self::watch_link(device, peripheral, events, link_token);
                }
                Err(e) => {
                    link_token.cancel();
                    post(&events, TransportEvent::ConnectFailed {
                        peripheral,
                        error: Some(e.to_string()),
                    });
                }
            }
        });
        Ok(())
    }

    async fn disconnect(&mut self, peripheral: &PeripheralId) -> Result<()> {
        let device = self.device(peripheral).await?;
        self.registry.lock().await.forget(peripheral);

        let adapter = self.adapter.clone();
        let events = self.events.clone();
        let peripheral = peripheral.clone();

        tokio::spawn(async move {
            info!("Disconnecting from device {}", peripheral);
            let error = match adapter.disconnect_device(&device).await {
                Ok(()) => None,
                Err(e) => {
                    warn!("Disconnect from {} failed: {}", peripheral, e);
                    Some(e.to_string())
                }
            };
            post(&events, TransportEvent::Disconnected { peripheral, error });
        });
        Ok(())
    }

    async fn discover_services(&mut self, peripheral: &PeripheralId) -> Result<()> {
        let device = self.device(peripheral).await?;
        let events = self.events.clone();
        let registry = self.registry.clone();
        let peripheral = peripheral.clone();

        tokio::spawn(async move {
            let result = match device.services().await {
                Ok(services) => {
                    let mut registry = registry.lock().await;
                    let refs = services
                        .into_iter()
                        .map(|service| {
                            let service_ref = ServiceRef::new(peripheral.clone(), service.uuid());
                            registry.services.insert(service_ref.clone(), service);
                            service_ref
                        })
                        .collect();
                    Ok(refs)
                }
                Err(e) => Err(e.to_string()),
            };
            post(&events, TransportEvent::ServicesDiscovered { peripheral, result });
        });
        Ok(())
    }

    async fn discover_characteristics(&mut self, service: &ServiceRef) -> Result<()> {
        let bluest_service = self
            .registry
            .lock()
            .await
            .services
            .get(service)
            .cloned()
            .ok_or_else(|| TransportError::UnknownService(service.clone()))?;
        let events = self.events.clone();
        let registry = self.registry.clone();
        let service = service.clone();

        tokio::spawn(async move {
            let result = match bluest_service.characteristics().await {
                Ok(characteristics) => {
                    let mut registry = registry.lock().await;
                    let refs = characteristics
                        .into_iter()
                        .map(|characteristic| {
                            let characteristic_ref =
                                CharacteristicRef::new(&service, characteristic.uuid());
                            registry
                                .characteristics
                                .insert(characteristic_ref.clone(), characteristic);
                            characteristic_ref
                        })
                        .collect();
                    Ok(refs)
                }
                Err(e) => Err(e.to_string()),
            };
            post(&events, TransportEvent::CharacteristicsDiscovered { service, result });
        });
        Ok(())
    }

    async fn set_notify(&mut self, characteristic: &CharacteristicRef, enabled: bool) -> Result<()> {
        if !enabled {
            if let Some(subscription) = self.registry.lock().await.subscriptions.remove(characteristic) {
                subscription.cancel();
            }
            post(&self.events, TransportEvent::NotifyStateChanged {
                characteristic: characteristic.clone(),
                result: Ok(false),
            });
            return Ok(());
        }

        let bluest_characteristic = self.characteristic(characteristic).await?;
        let cancel_token = CancellationToken::new();
        if let Some(previous) = self
            .registry
            .lock()
            .await
            .subscriptions
            .insert(characteristic.clone(), cancel_token.clone())
        {
            previous.cancel();
        }

        let events = self.events.clone();
        let characteristic = characteristic.clone();

        tokio::spawn(async move {
            let mut notification_stream = match bluest_characteristic.notify().await {
                Ok(stream) => stream,
                Err(e) => {
                    error!("Failed to subscribe to {}: {}", characteristic.uuid, e);
                    post(&events, TransportEvent::NotifyStateChanged {
                        characteristic,
                        result: Err(e.to_string()),
                    });
                    return;
                }
            };
            post(&events, TransportEvent::NotifyStateChanged {
                characteristic: characteristic.clone(),
                result: Ok(true),
            });

            loop {
                tokio::select! {
                    value = notification_stream.next() => {
                        let result = match value {
                            Some(Ok(bytes)) => Ok(bytes),
                            Some(Err(e)) => Err(e.to_string()),
                            None => {
                                info!("Notification stream of {} ended", characteristic.uuid);
                                break;
                            }
                        };
                        post(&events, TransportEvent::ValueUpdated {
                            characteristic: characteristic.clone(),
                            result,
                        });
                    }
                    _ = cancel_token.cancelled() => break,
                }
            }
        });
        Ok(())
    }

    async fn write_value(&mut self, characteristic: &CharacteristicRef, value: &[u8]) -> Result<()> {
        let bluest_characteristic = self.characteristic(characteristic).await?;
        let events = self.events.clone();
        let characteristic = characteristic.clone();
        let value = value.to_vec();

        tokio::spawn(async move {
            let result = bluest_characteristic
                .write(&value)
                .await
                .map_err(|e| e.to_string());
            post(&events, TransportEvent::ValueWritten {
                characteristic,
                result,
            });
        });
        Ok(())
    }
}

fn post(events: &EventSender, event: TransportEvent) {
    if events.send(event.into()).is_err() {
        debug!("Event inbox closed, transport event dropped.");
    }
}
