//! Connection lifecycle of the SensorTag
//! This module holds the state machine that walks a SensorTag from discovery
//! through service negotiation to streaming and back to idle.
//!
//! [`handle_event`] is a pure transition: it takes the current
//! [`ConnectionState`] and one [`Event`] and returns the next state together
//! with the [`Effect`]s to carry out. It never talks to the radio itself.

use std::fmt;
use std::time::Duration;

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::bluetooth::commands::TransportCommand;
use crate::core::bluetooth::constants::{
    ADVERTISING_UUID, ChannelRole, DEFAULT_PAUSE_WINDOW_MS, DEFAULT_SCAN_WINDOW_MS, HUMIDITY_SERVICE,
    SensorKind, TEMPERATURE_SERVICE, channel_role, is_temperature_or_humidity_service,
};
use crate::core::bluetooth::device::DeviceMatcher;
use crate::core::bluetooth::notification::SinkEvent;
use crate::core::bluetooth::scanner::{ScanAction, ScanPhase, ScanScheduler, TimerToken};
use crate::core::bluetooth::types::{
    CharacteristicRef, Event, PeripheralId, RadioState, ServiceRef, TransportEvent, UserRequest,
};
use crate::core::codec::{decode_humidity_sample, decode_temperature_sample};
use crate::error::ErrorKind;

/// Where the bridge is in the life of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Idle,
    Scanning,
    Connecting,
    DiscoveringServices,
    DiscoveringCharacteristics,
    Subscribing,
    Streaming,
    Disconnecting,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Connecting => "connecting",
            Self::DiscoveringServices => "discovering services",
            Self::DiscoveringCharacteristics => "discovering characteristics",
            Self::Subscribing => "subscribing",
            Self::Streaming => "streaming",
            Self::Disconnecting => "disconnecting",
        };
        f.write_str(name)
    }
}

/// Which sensor channels must be subscribed before streaming starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelPolicy {
    /// Stream as soon as every data channel the peripheral exposes is
    /// subscribed, even if that is only one of the two.
    #[default]
    AnyDiscovered,
    /// Abort the attempt unless both temperature and humidity are available.
    RequireBoth,
}

/// Fixed inputs of the state machine
#[derive(Debug, Clone)]
pub struct MachineConfig {
    pub matcher: DeviceMatcher,
    /// Service filter passed to the transport scan; empty scans everything.
    pub scan_filter: Vec<Uuid>,
    pub scan_window: Duration,
    pub pause_window: Duration,
    /// Candidates weaker than this are skipped.
    pub min_rssi: Option<i16>,
    pub channel_policy: ChannelPolicy,
    /// Start searching as soon as the radio powers on.
    pub scan_on_power_on: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            matcher: DeviceMatcher::default(),
            scan_filter: vec![ADVERTISING_UUID],
            scan_window: Duration::from_millis(DEFAULT_SCAN_WINDOW_MS),
            pause_window: Duration::from_millis(DEFAULT_PAUSE_WINDOW_MS),
            min_rssi: None,
            channel_policy: ChannelPolicy::AnyDiscovered,
            scan_on_power_on: true,
        }
    }
}

/// Work the caller must carry out after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Transport(TransportCommand),
    /// Arm the scan timer, replacing any pending one.
    ArmTimer { after: Duration, token: TimerToken },
    CancelTimer,
    Sink(SinkEvent),
}

/// Everything the state machine knows about the current connection
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionState {
    lifecycle: Lifecycle,
    radio: RadioState,
    peripheral: Option<PeripheralId>,
    temperature_channel: Option<CharacteristicRef>,
    humidity_channel: Option<CharacteristicRef>,
    keep_scanning: bool,
    last_temperature_f: Option<i32>,
    last_humidity_pct: Option<f64>,
    scanner: ScanScheduler,
    // services still waiting for characteristic discovery
    pending_services: Vec<Uuid>,
    // data channels whose subscription isn't confirmed yet
    pending_subscriptions: Vec<SensorKind>,
}

impl ConnectionState {
    pub fn new(scan_window: Duration, pause_window: Duration) -> Self {
        Self {
            lifecycle: Lifecycle::Idle,
            radio: RadioState::Unknown,
            peripheral: None,
            temperature_channel: None,
            humidity_channel: None,
            keep_scanning: false,
            last_temperature_f: None,
            last_humidity_pct: None,
            scanner: ScanScheduler::new(scan_window, pause_window),
            pending_services: Vec::new(),
            pending_subscriptions: Vec::new(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn radio(&self) -> RadioState {
        self.radio
    }

    pub fn peripheral(&self) -> Option<&PeripheralId> {
        self.peripheral.as_ref()
    }

    pub fn temperature_channel(&self) -> Option<&CharacteristicRef> {
        self.temperature_channel.as_ref()
    }

    pub fn humidity_channel(&self) -> Option<&CharacteristicRef> {
        self.humidity_channel.as_ref()
    }

    pub fn keep_scanning(&self) -> bool {
        self.keep_scanning
    }

    pub fn last_temperature_f(&self) -> Option<i32> {
        self.last_temperature_f
    }

    pub fn last_humidity_pct(&self) -> Option<f64> {
        self.last_humidity_pct
    }

    pub fn scanner(&self) -> &ScanScheduler {
        &self.scanner
    }

    pub fn pending_subscriptions(&self) -> &[SensorKind] {
        &self.pending_subscriptions
    }

    fn channel_kind(&self, characteristic: &CharacteristicRef) -> Option<SensorKind> {
        if self.temperature_channel.as_ref() == Some(characteristic) {
            Some(SensorKind::Temperature)
        } else if self.humidity_channel.as_ref() == Some(characteristic) {
            Some(SensorKind::Humidity)
        } else {
            None
        }
    }

    fn channel_slot(&mut self, kind: SensorKind) -> &mut Option<CharacteristicRef> {
        match kind {
            SensorKind::Temperature => &mut self.temperature_channel,
            SensorKind::Humidity => &mut self.humidity_channel,
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_SCAN_WINDOW_MS),
            Duration::from_millis(DEFAULT_PAUSE_WINDOW_MS),
        )
    }
}

/// Applies one event to the connection state.
pub fn handle_event(
    state: ConnectionState,
    event: Event,
    config: &MachineConfig,
) -> (ConnectionState, Vec<Effect>) {
    let mut step = Step {
        state,
        config,
        effects: Vec::new(),
    };
    step.apply(event);
    (step.state, step.effects)
}

/// Owns the connection state between events
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    state: ConnectionState,
    config: MachineConfig,
}

impl ConnectionMachine {
    pub fn new(config: MachineConfig) -> Self {
        Self {
            state: ConnectionState::new(config.scan_window, config.pause_window),
            config,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = handle_event(state, event, &self.config);
        self.state = state;
        effects
    }
}

struct Step<'a> {
    state: ConnectionState,
    config: &'a MachineConfig,
    effects: Vec<Effect>,
}

impl Step<'_> {
    fn apply(&mut self, event: Event) {
        match event {
            Event::User(UserRequest::Connect) => self.on_connect_request(),
            Event::User(UserRequest::Disconnect) => self.on_disconnect_request(),
            Event::ScanTimer(token) => self.on_scan_timer(token),
            Event::Transport(event) => self.on_transport(event),
        }
    }

    fn on_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::AdapterStateChanged(radio) => self.on_radio(radio),
            TransportEvent::PeripheralDiscovered {
                peripheral,
                name,
                rssi,
            } => self.on_discovered(peripheral, name, rssi),
            TransportEvent::Connected { peripheral } => self.on_connected(peripheral),
            TransportEvent::ConnectFailed { peripheral, error } => {
                self.on_connect_failed(peripheral, error)
            }
            TransportEvent::Disconnected { peripheral, error } => {
                self.on_disconnected(peripheral, error)
            }
            TransportEvent::ServicesDiscovered { peripheral, result } => {
                self.on_services(peripheral, result)
            }
            TransportEvent::CharacteristicsDiscovered { service, result } => {
                self.on_characteristics(service, result)
            }
            TransportEvent::NotifyStateChanged {
                characteristic,
                result,
            } => self.on_notify_state(characteristic, result),
            TransportEvent::ValueWritten {
                characteristic,
                result,
            } => self.on_value_written(characteristic, result),
            TransportEvent::ValueUpdated {
                characteristic,
                result,
            } => self.on_value_updated(characteristic, result),
        }
    }

    // user requests

    fn on_connect_request(&mut self) {
        self.state.keep_scanning = true;
        if self.state.lifecycle != Lifecycle::Idle {
            debug!("Connect requested while {}, nothing to do.", self.state.lifecycle);
            return;
        }
        let radio = self.state.radio;
        if radio == RadioState::PoweredOn {
            self.begin_scanning();
        } else if radio.is_unavailable() {
            self.report(ErrorKind::TransportUnavailable, radio.describe());
        } else {
            info!("Radio is {:?}, scanning starts once it powers on.", radio);
        }
    }

    fn on_disconnect_request(&mut self) {
        self.state.keep_scanning = false;
        match self.state.lifecycle {
            Lifecycle::Idle | Lifecycle::Disconnecting => {
                debug!("Disconnect requested while {}, nothing to do.", self.state.lifecycle);
            }
            Lifecycle::Scanning => {
                info!("Scan cancelled.");
                self.reset_to_idle();
            }
            _ => self.begin_disconnect(),
        }
    }

    fn on_scan_timer(&mut self, token: TimerToken) {
        let actions = self.state.scanner.on_timer(token, self.state.keep_scanning);
        self.scan(actions);
        if self.state.lifecycle == Lifecycle::Scanning
            && self.state.scanner.phase() == ScanPhase::Off
        {
            self.transition(Lifecycle::Idle);
        }
    }

    // transport events

    fn on_radio(&mut self, radio: RadioState) {
        let previous = std::mem::replace(&mut self.state.radio, radio);
        if previous != radio {
            info!("Radio state {:?} -> {:?}.", previous, radio);
        }

        if radio == RadioState::PoweredOn {
            if self.state.lifecycle == Lifecycle::Idle
                && (self.state.keep_scanning || self.config.scan_on_power_on)
            {
                self.state.keep_scanning = true;
                self.begin_scanning();
            }
            return;
        }

        if previous != radio {
            self.report(ErrorKind::TransportUnavailable, radio.describe());
        }
        if self.state.lifecycle != Lifecycle::Idle {
            self.reset_to_idle();
        }
    }

    fn on_discovered(&mut self, peripheral: PeripheralId, name: Option<String>, rssi: Option<i16>) {
        if self.state.lifecycle != Lifecycle::Scanning || self.state.peripheral.is_some() {
            trace!(
                "Ignoring discovery of {} while {}.",
                peripheral, self.state.lifecycle
            );
            return;
        }
        if !self.config.matcher.matches(name.as_deref()) {
            trace!("Skipping peripheral {} ({:?}).", peripheral, name);
            return;
        }
        if let Some(floor) = self.config.min_rssi {
            if rssi.is_none_or(|rssi| rssi < floor) {
                debug!(
                    "Skipping {} ({:?}): RSSI {:?} below {}.",
                    peripheral, name, rssi, floor
                );
                return;
            }
        }

        info!("SensorTag found: {} ({:?}, RSSI {:?}).", peripheral, name, rssi);
        let actions = self.state.scanner.stop();
        self.scan(actions);
        self.state.peripheral = Some(peripheral.clone());
        self.transition(Lifecycle::Connecting);
        self.command(TransportCommand::Connect(peripheral));
    }

    fn on_connected(&mut self, peripheral: PeripheralId) {
        if !self.expects(Lifecycle::Connecting, &peripheral) {
            return;
        }
        info!("Connected to {}, discovering services...", peripheral);
        self.transition(Lifecycle::DiscoveringServices);
        self.command(TransportCommand::DiscoverServices(peripheral));
    }

    fn on_connect_failed(&mut self, peripheral: PeripheralId, error: Option<String>) {
        if !self.expects(Lifecycle::Connecting, &peripheral) {
            return;
        }
        self.report(
            ErrorKind::ConnectFailed,
            &format!(
                "Connection to {} failed: {}",
                peripheral,
                error.as_deref().unwrap_or("unknown error")
            ),
        );
        self.reset_to_idle();
        self.resume_scanning_if_wanted();
    }

    fn on_disconnected(&mut self, peripheral: PeripheralId, error: Option<String>) {
        if self.state.lifecycle == Lifecycle::Idle || !self.is_current(&peripheral) {
            trace!("Ignoring disconnect of {}.", peripheral);
            return;
        }
        let requested = self.state.lifecycle == Lifecycle::Disconnecting;
        info!("Disconnected from {}.", peripheral);
        self.reset_to_idle();
        if !requested {
            self.report(
                ErrorKind::UnexpectedDisconnect,
                &format!(
                    "Lost connection to {}: {}",
                    peripheral,
                    error.as_deref().unwrap_or("link lost")
                ),
            );
        }
        self.resume_scanning_if_wanted();
    }

    fn on_services(&mut self, peripheral: PeripheralId, result: Result<Vec<ServiceRef>, String>) {
        if !self.expects(Lifecycle::DiscoveringServices, &peripheral) {
            return;
        }
        let services = match result {
            Ok(services) => services,
            Err(e) => {
                self.fail_attempt(
                    ErrorKind::DiscoveryFailed,
                    &format!("Service discovery failed: {}", e),
                );
                return;
            }
        };

        let mut matched: Vec<ServiceRef> = Vec::new();
        for service in services {
            debug!("Discovered service {}", service.uuid);
            if service.peripheral == peripheral
                && is_temperature_or_humidity_service(&service.uuid)
                && !matched.contains(&service)
            {
                matched.push(service);
            }
        }

        if matched.is_empty() {
            self.fail_attempt(
                ErrorKind::DiscoveryFailed,
                "No temperature or humidity service found",
            );
            return;
        }
        if self.config.channel_policy == ChannelPolicy::RequireBoth {
            let has = |uuid| matched.iter().any(|s| s.uuid == uuid);
            if !(has(TEMPERATURE_SERVICE) && has(HUMIDITY_SERVICE)) {
                self.fail_attempt(
                    ErrorKind::DiscoveryFailed,
                    "SensorTag is missing the temperature or humidity service",
                );
                return;
            }
        }

        self.state.pending_services = matched.iter().map(|s| s.uuid).collect();
        self.transition(Lifecycle::DiscoveringCharacteristics);
        for service in matched {
            self.command(TransportCommand::DiscoverCharacteristics(service));
        }
    }

    fn on_characteristics(
        &mut self,
        service: ServiceRef,
        result: Result<Vec<CharacteristicRef>, String>,
    ) {
        let negotiating = matches!(
            self.state.lifecycle,
            Lifecycle::DiscoveringCharacteristics | Lifecycle::Subscribing
        );
        if !negotiating
            || !self.is_current(&service.peripheral)
            || !self.state.pending_services.contains(&service.uuid)
        {
            trace!("Ignoring characteristics of {}.", service.uuid);
            return;
        }
        self.state.pending_services.retain(|uuid| *uuid != service.uuid);

        match result {
            Ok(characteristics) => {
                for characteristic in characteristics {
                    if characteristic.peripheral != service.peripheral
                        || characteristic.service != service.uuid
                    {
                        continue;
                    }
                    match channel_role(&characteristic.uuid) {
                        Some(ChannelRole::Data(kind)) => self.subscribe(kind, characteristic),
                        Some(ChannelRole::Enable(kind)) => {
                            debug!("Enabling {:?} sensor.", kind);
                            self.command(TransportCommand::enable_sensor(characteristic));
                        }
                        None => trace!("Unused characteristic {}", characteristic.uuid),
                    }
                }
            }
            Err(e) => self.report(
                ErrorKind::DiscoveryFailed,
                &format!("Characteristic discovery for {} failed: {}", service.uuid, e),
            ),
        }

        self.check_negotiation();
    }

    fn on_notify_state(&mut self, characteristic: CharacteristicRef, result: Result<bool, String>) {
        if self.state.lifecycle != Lifecycle::Subscribing || !self.is_current(&characteristic.peripheral)
        {
            trace!("Ignoring notify state of {}.", characteristic.uuid);
            return;
        }
        let Some(kind) = self.state.channel_kind(&characteristic) else {
            trace!("Ignoring notify state of unknown {}.", characteristic.uuid);
            return;
        };
        if !self.state.pending_subscriptions.contains(&kind) {
            return;
        }

        match result {
            Ok(true) => {
                info!("Subscribed to {:?} notifications.", kind);
                self.state.pending_subscriptions.retain(|k| *k != kind);
            }
            Ok(false) => {
                debug!("{:?} notifications reported off while subscribing.", kind);
                return;
            }
            Err(e) => {
                self.state.pending_subscriptions.retain(|k| *k != kind);
                *self.state.channel_slot(kind) = None;
                self.report(
                    ErrorKind::ConfigurationFailed,
                    &format!("Enabling {:?} notifications failed: {}", kind, e),
                );
            }
        }
        self.check_negotiation();
    }

    fn on_value_written(&mut self, characteristic: CharacteristicRef, result: Result<(), String>) {
        if !self.is_current(&characteristic.peripheral) {
            return;
        }
        match result {
            Ok(()) => debug!("Wrote {}.", characteristic.uuid),
            Err(e) => self.report(
                ErrorKind::ConfigurationFailed,
                &format!("Writing {} failed: {}", characteristic.uuid, e),
            ),
        }
    }

    fn on_value_updated(&mut self, characteristic: CharacteristicRef, result: Result<Vec<u8>, String>) {
        if self.state.lifecycle != Lifecycle::Streaming
            || !self.is_current(&characteristic.peripheral)
        {
            trace!("Dropping update for {} while {}.", characteristic.uuid, self.state.lifecycle);
            return;
        }
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Error on updating value for {}: {}", characteristic.uuid, e);
                return;
            }
        };

        match self.state.channel_kind(&characteristic) {
            Some(SensorKind::Temperature) => match decode_temperature_sample(&bytes) {
                Ok(sample) => {
                    debug!(
                        "Temperature ambient {:.2}°C / {:.2}°F, infrared {:.2}°C",
                        sample.ambient_c, sample.ambient_f, sample.infrared_c
                    );
                    let fahrenheit = sample.fahrenheit();
                    self.state.last_temperature_f = Some(fahrenheit);
                    self.effects.push(Effect::Sink(SinkEvent::Temperature { fahrenheit }));
                }
                Err(e) => self.report(
                    ErrorKind::MalformedPayload,
                    &format!("Temperature sample dropped: {}", e),
                ),
            },
            Some(SensorKind::Humidity) => match decode_humidity_sample(&bytes) {
                Ok(sample) => {
                    debug!(
                        "Humidity {:.2}%, on-die temperature {:.2}°C",
                        sample.relative_humidity_pct, sample.on_die_temperature_c
                    );
                    let percent = sample.relative_humidity_pct;
                    self.state.last_humidity_pct = Some(percent);
                    self.effects.push(Effect::Sink(SinkEvent::Humidity { percent }));
                }
                Err(e) => self.report(
                    ErrorKind::MalformedPayload,
                    &format!("Humidity sample dropped: {}", e),
                ),
            },
            None => trace!("Ignoring update for unrecognized {}.", characteristic.uuid),
        }
    }

    // helpers

    fn subscribe(&mut self, kind: SensorKind, characteristic: CharacteristicRef) {
        if self.state.channel_slot(kind).is_some() {
            debug!("Duplicate {:?} data characteristic ignored.", kind);
            return;
        }
        if self.state.lifecycle == Lifecycle::DiscoveringCharacteristics {
            self.transition(Lifecycle::Subscribing);
        }
        *self.state.channel_slot(kind) = Some(characteristic.clone());
        self.state.pending_subscriptions.push(kind);
        self.command(TransportCommand::SetNotify {
            characteristic,
            enabled: true,
        });
    }

    /// Moves on once every service has reported its characteristics and
    /// every discovered data channel is subscribed.
    fn check_negotiation(&mut self) {
        if !self.state.pending_services.is_empty() {
            return;
        }
        let temperature = self.state.temperature_channel.is_some();
        let humidity = self.state.humidity_channel.is_some();
        if !temperature && !humidity {
            self.fail_attempt(
                ErrorKind::DiscoveryFailed,
                "No sensor data characteristic could be subscribed",
            );
            return;
        }
        if self.config.channel_policy == ChannelPolicy::RequireBoth && !(temperature && humidity) {
            self.fail_attempt(
                ErrorKind::DiscoveryFailed,
                "SensorTag did not provide both temperature and humidity channels",
            );
            return;
        }
        if self.state.pending_subscriptions.is_empty()
            && self.state.lifecycle == Lifecycle::Subscribing
        {
            self.transition(Lifecycle::Streaming);
        }
    }

    fn begin_scanning(&mut self) {
        self.transition(Lifecycle::Scanning);
        let actions = self.state.scanner.start();
        self.scan(actions);
    }

    fn resume_scanning_if_wanted(&mut self) {
        if self.state.keep_scanning && self.state.radio == RadioState::PoweredOn {
            self.begin_scanning();
        }
    }

    fn begin_disconnect(&mut self) {
        let Some(peripheral) = self.state.peripheral.clone() else {
            self.reset_to_idle();
            return;
        };
        let actions = self.state.scanner.stop();
        self.scan(actions);
        for characteristic in [
            self.state.temperature_channel.take(),
            self.state.humidity_channel.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.command(TransportCommand::SetNotify {
                characteristic,
                enabled: false,
            });
        }
        self.clear_negotiation();
        self.transition(Lifecycle::Disconnecting);
        self.command(TransportCommand::Disconnect(peripheral));
    }

    fn fail_attempt(&mut self, kind: ErrorKind, message: &str) {
        self.report(kind, message);
        self.begin_disconnect();
    }

    fn reset_to_idle(&mut self) {
        let actions = self.state.scanner.stop();
        self.scan(actions);
        self.state.peripheral = None;
        self.state.temperature_channel = None;
        self.state.humidity_channel = None;
        self.clear_negotiation();
        self.transition(Lifecycle::Idle);
    }

    fn clear_negotiation(&mut self) {
        self.state.pending_services.clear();
        self.state.pending_subscriptions.clear();
    }

    fn expects(&self, lifecycle: Lifecycle, peripheral: &PeripheralId) -> bool {
        if self.state.lifecycle == lifecycle && self.is_current(peripheral) {
            return true;
        }
        trace!(
            "Ignoring stale event for {} while {}.",
            peripheral, self.state.lifecycle
        );
        false
    }

    fn is_current(&self, peripheral: &PeripheralId) -> bool {
        self.state.peripheral.as_ref() == Some(peripheral)
    }

    fn transition(&mut self, to: Lifecycle) {
        if self.state.lifecycle == to {
            return;
        }
        info!("Lifecycle {} -> {}", self.state.lifecycle, to);
        self.state.lifecycle = to;
        self.effects
            .push(Effect::Sink(SinkEvent::LifecycleChanged { state: to }));
    }

    fn report(&mut self, kind: ErrorKind, message: &str) {
        warn!("{}: {}", kind, message);
        self.effects.push(Effect::Sink(SinkEvent::Error {
            kind,
            message: message.to_string(),
        }));
    }

    fn command(&mut self, command: TransportCommand) {
        self.effects.push(Effect::Transport(command));
    }

    fn scan(&mut self, actions: Vec<ScanAction>) {
        for action in actions {
            let effect = match action {
                ScanAction::StartScan => Effect::Transport(TransportCommand::StartScan {
                    filter: self.config.scan_filter.clone(),
                }),
                ScanAction::StopScan => Effect::Transport(TransportCommand::StopScan),
                ScanAction::ArmTimer { after, token } => Effect::ArmTimer { after, token },
                ScanAction::CancelTimer => Effect::CancelTimer,
            };
            self.effects.push(effect);
        }
    }
}
