//! Constants used throughout the application
//! This module describes what a supported SensorTag looks like: the
//! advertised identifier, the GATT services and characteristics of the
//! temperature and humidity sensors, and the channel layout of their
//! payloads.
//!
//! TI sensor UUIDs are 128-bit values built from the TI base
//! `F0000000-0451-4000-B000-000000000000` with the documented 16-bit
//! identifier placed in bits 96..112, e.g. `0xAA01` becomes
//! `F000AA01-0451-4000-B000-000000000000`.

use uuid::Uuid;

/// The advertised local name of a supported SensorTag
pub const SENSOR_TAG_NAME: &str = "CC2650 SensorTag";

/// TI base UUID for SensorTag sensor services
pub const TI_BASE_UUID: u128 = 0xf0000000_0451_4000_b000_000000000000;

/// Bluetooth SIG base UUID, used to expand 16-bit advertised identifiers
pub const SIG_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;

/// Expands a 16-bit TI sensor identifier into its 128-bit UUID.
pub const fn ti_uuid(short: u16) -> Uuid {
    Uuid::from_u128(TI_BASE_UUID | ((short as u128) << 96))
}

/// Expands a 16-bit advertised identifier on the Bluetooth SIG base.
pub const fn sig_uuid(short: u16) -> Uuid {
    Uuid::from_u128(SIG_BASE_UUID | ((short as u128) << 96))
}

/// Short identifier a SensorTag advertises, used as the scan filter
pub const ADVERTISING_ID: u16 = 0xAA10;
pub const ADVERTISING_UUID: Uuid = sig_uuid(ADVERTISING_ID);

/// IR temperature service and characteristics
pub const TEMPERATURE_SERVICE: Uuid = ti_uuid(0xAA00);
pub const TEMPERATURE_DATA: Uuid = ti_uuid(0xAA01);
pub const TEMPERATURE_ENABLE: Uuid = ti_uuid(0xAA02);

/// Humidity service and characteristics
pub const HUMIDITY_SERVICE: Uuid = ti_uuid(0xAA20);
pub const HUMIDITY_DATA: Uuid = ti_uuid(0xAA21);
pub const HUMIDITY_ENABLE: Uuid = ti_uuid(0xAA22);

/// Vendor string forms of the addresses above
pub const TEMPERATURE_SERVICE_STR: &str = "F000AA00-0451-4000-B000-000000000000";
pub const TEMPERATURE_DATA_STR: &str = "F000AA01-0451-4000-B000-000000000000";
pub const TEMPERATURE_ENABLE_STR: &str = "F000AA02-0451-4000-B000-000000000000";
pub const HUMIDITY_SERVICE_STR: &str = "F000AA20-0451-4000-B000-000000000000";
pub const HUMIDITY_DATA_STR: &str = "F000AA21-0451-4000-B000-000000000000";
pub const HUMIDITY_ENABLE_STR: &str = "F000AA22-0451-4000-B000-000000000000";

/// Channel (16-bit word) indices within the temperature payload
pub const TEMPERATURE_CHANNEL_INFRARED: usize = 0;
pub const TEMPERATURE_CHANNEL_AMBIENT: usize = 1;

/// Channel indices within the humidity payload
pub const HUMIDITY_CHANNEL_TEMPERATURE: usize = 0;
pub const HUMIDITY_CHANNEL_HUMIDITY: usize = 1;

/// Value written to a sensor's config characteristic to switch it on
pub const SENSOR_ENABLE_VALUE: u8 = 0x01;

/// Default active scan window in milliseconds
pub const DEFAULT_SCAN_WINDOW_MS: u64 = 2_000;

/// Default scan pause in milliseconds
pub const DEFAULT_PAUSE_WINDOW_MS: u64 = 10_000;

/// How often the transport checks that a connected link is still up
pub const LINK_POLL_INTERVAL_MS: u64 = 1_000;

/// The sensors a SensorTag exposes to this bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Temperature,
    Humidity,
}

/// What a discovered characteristic is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    Data(SensorKind),
    Enable(SensorKind),
}

pub fn is_temperature_data_channel(id: &Uuid) -> bool {
    *id == TEMPERATURE_DATA
}

pub fn is_temperature_enable_channel(id: &Uuid) -> bool {
    *id == TEMPERATURE_ENABLE
}

pub fn is_humidity_data_channel(id: &Uuid) -> bool {
    *id == HUMIDITY_DATA
}

pub fn is_humidity_enable_channel(id: &Uuid) -> bool {
    *id == HUMIDITY_ENABLE
}

pub fn is_temperature_or_humidity_service(id: &Uuid) -> bool {
    *id == TEMPERATURE_SERVICE || *id == HUMIDITY_SERVICE
}

/// Classifies a characteristic by its address.
pub fn channel_role(id: &Uuid) -> Option<ChannelRole> {
    if is_temperature_data_channel(id) {
        Some(ChannelRole::Data(SensorKind::Temperature))
    } else if is_temperature_enable_channel(id) {
        Some(ChannelRole::Enable(SensorKind::Temperature))
    } else if is_humidity_data_channel(id) {
        Some(ChannelRole::Data(SensorKind::Humidity))
    } else if is_humidity_enable_channel(id) {
        Some(ChannelRole::Enable(SensorKind::Humidity))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_match_vendor_strings() {
        let pairs = [
            (TEMPERATURE_SERVICE, TEMPERATURE_SERVICE_STR),
            (TEMPERATURE_DATA, TEMPERATURE_DATA_STR),
            (TEMPERATURE_ENABLE, TEMPERATURE_ENABLE_STR),
            (HUMIDITY_SERVICE, HUMIDITY_SERVICE_STR),
            (HUMIDITY_DATA, HUMIDITY_DATA_STR),
            (HUMIDITY_ENABLE, HUMIDITY_ENABLE_STR),
        ];
        for (uuid, vendor) in pairs {
            assert_eq!(uuid.hyphenated().to_string().to_uppercase(), vendor);
            assert_eq!(Uuid::parse_str(vendor).unwrap(), uuid);
        }
    }

    #[test]
    fn advertising_id_expands_on_sig_base() {
        assert_eq!(
            ADVERTISING_UUID.to_string(),
            "0000aa10-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn predicates_only_match_their_own_address() {
        assert!(is_temperature_data_channel(&TEMPERATURE_DATA));
        assert!(!is_temperature_data_channel(&HUMIDITY_DATA));
        assert!(is_temperature_enable_channel(&TEMPERATURE_ENABLE));
        assert!(is_humidity_data_channel(&HUMIDITY_DATA));
        assert!(is_humidity_enable_channel(&HUMIDITY_ENABLE));
        assert!(!is_humidity_enable_channel(&TEMPERATURE_ENABLE));
        assert!(is_temperature_or_humidity_service(&TEMPERATURE_SERVICE));
        assert!(is_temperature_or_humidity_service(&HUMIDITY_SERVICE));
        assert!(!is_temperature_or_humidity_service(&TEMPERATURE_DATA));
        assert!(!is_temperature_or_humidity_service(&ti_uuid(0xAA40)));
    }

    #[test]
    fn channel_roles() {
        assert_eq!(
            channel_role(&TEMPERATURE_DATA),
            Some(ChannelRole::Data(SensorKind::Temperature))
        );
        assert_eq!(
            channel_role(&HUMIDITY_ENABLE),
            Some(ChannelRole::Enable(SensorKind::Humidity))
        );
        assert_eq!(channel_role(&ti_uuid(0xAA03)), None);
    }
}
