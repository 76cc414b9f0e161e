//! SensorTag payload decoding
//! Converts raw notification payloads from the temperature and humidity
//! services into physical units.
//!
//! Both payloads are two unsigned 16-bit little-endian channels:
//!
//! ```text
//! temperature: [0-1] infrared raw   [2-3] ambient raw
//! humidity:    [0-1] on-die temp raw [2-3] humidity raw
//! ```

use serde::Serialize;

use crate::core::bluetooth::{
    HUMIDITY_CHANNEL_HUMIDITY, HUMIDITY_CHANNEL_TEMPERATURE, TEMPERATURE_CHANNEL_AMBIENT,
    TEMPERATURE_CHANNEL_INFRARED,
};
use crate::error::CodecError;

/// Minimum payload length: two 16-bit channels.
pub const SAMPLE_LEN: usize = 4;

/// Raw temperature counts per degree Celsius.
const TEMPERATURE_COUNTS_PER_DEGREE: f64 = 128.0;

/// Full scale of a 16-bit humidity-sensor reading (2^16).
const HUMIDITY_FULL_SCALE: f64 = 65536.0;

/// The two low bits of the humidity count are status bits.
const HUMIDITY_STATUS_MASK: u16 = 0x0003;

/// Decoded temperature-service sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureSample {
    pub infrared_c: f64,
    pub ambient_c: f64,
    pub ambient_f: f64,
}

impl TemperatureSample {
    /// Ambient temperature in °F, truncated toward zero for display.
    pub fn fahrenheit(&self) -> i32 {
        self.ambient_f.trunc() as i32
    }

    pub fn infrared_f(&self) -> f64 {
        celsius_to_fahrenheit(self.infrared_c)
    }
}

/// Decoded humidity-service sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HumiditySample {
    pub on_die_temperature_c: f64,
    pub relative_humidity_pct: f64,
}

impl HumiditySample {
    pub fn on_die_temperature_f(&self) -> f64 {
        celsius_to_fahrenheit(self.on_die_temperature_c)
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

/// Decodes a temperature notification.
pub fn decode_temperature_sample(bytes: &[u8]) -> Result<TemperatureSample, CodecError> {
    let infrared = read_channel(bytes, TEMPERATURE_CHANNEL_INFRARED)?;
    let ambient = read_channel(bytes, TEMPERATURE_CHANNEL_AMBIENT)?;

    let infrared_c = f64::from(infrared) / TEMPERATURE_COUNTS_PER_DEGREE;
    let ambient_c = f64::from(ambient) / TEMPERATURE_COUNTS_PER_DEGREE;

    Ok(TemperatureSample {
        infrared_c,
        ambient_c,
        ambient_f: celsius_to_fahrenheit(ambient_c),
    })
}

/// Decodes a humidity notification.
pub fn decode_humidity_sample(bytes: &[u8]) -> Result<HumiditySample, CodecError> {
    let raw_temperature = read_channel(bytes, HUMIDITY_CHANNEL_TEMPERATURE)?;
    let raw_humidity = read_channel(bytes, HUMIDITY_CHANNEL_HUMIDITY)?;

    Ok(HumiditySample {
        on_die_temperature_c: humidity_temperature(raw_temperature),
        relative_humidity_pct: relative_humidity(raw_humidity),
    })
}

// T = -46.85 + 175.72 * ST / 2^16
fn humidity_temperature(raw: u16) -> f64 {
    -46.85 + 175.72 * f64::from(raw) / HUMIDITY_FULL_SCALE
}

// RH = -6 + 125 * SRH / 2^16, status bits cleared first
fn relative_humidity(raw: u16) -> f64 {
    let cleared = raw & !HUMIDITY_STATUS_MASK;
    -6.0 + 125.0 * f64::from(cleared) / HUMIDITY_FULL_SCALE
}

fn read_channel(bytes: &[u8], index: usize) -> Result<u16, CodecError> {
    if bytes.len() < SAMPLE_LEN {
        return Err(CodecError::MalformedPayload {
            expected: SAMPLE_LEN,
            actual: bytes.len(),
        });
    }
    let offset = index * 2;
    Ok(u16::from_le_bytes([bytes[offset], bytes[offset + 1]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn ambient_count_4301_displays_92() {
        // infrared 0, ambient 4301 (0x10CD)
        let sample = decode_temperature_sample(&[0x00, 0x00, 0xCD, 0x10]).unwrap();
        assert!(approx(sample.ambient_c, 33.6015625));
        assert!(approx(sample.ambient_f, 92.4828125));
        assert_eq!(sample.fahrenheit(), 92);
    }

    #[test]
    fn channels_are_little_endian_infrared_first() {
        let sample = decode_temperature_sample(&[0x00, 0x01, 0x00, 0x11]).unwrap();
        assert!(approx(sample.infrared_c, 2.0));
        assert!(approx(sample.ambient_c, 34.0));
        assert!(approx(sample.ambient_f, 93.2));
        assert_eq!(sample.fahrenheit(), 93);
        assert!(approx(sample.infrared_f(), 35.6));
    }

    #[test]
    fn fahrenheit_truncates_toward_zero_below_freezing() {
        // 0 °C ambient is 32 °F; infrared irrelevant
        let sample = decode_temperature_sample(&[0xFF, 0xFF, 0x00, 0x00]).unwrap();
        assert_eq!(sample.fahrenheit(), 32);
        assert!(approx(sample.infrared_c, 65535.0 / 128.0));
    }

    #[test]
    fn humidity_clears_status_bits() {
        // 40000 = 0x9C40, low bits already clear; 40003 = 0x9C43 has both set
        let clear = decode_humidity_sample(&[0x00, 0x00, 0x40, 0x9C]).unwrap();
        let flagged = decode_humidity_sample(&[0x00, 0x00, 0x43, 0x9C]).unwrap();
        assert!(approx(clear.relative_humidity_pct, flagged.relative_humidity_pct));

        let expected = -6.0 + 125.0 * 40000.0 / 65536.0;
        assert!(approx(flagged.relative_humidity_pct, expected));
    }

    #[test]
    fn humidity_count_40002_masks_to_40000() {
        // 40002 & !3 == 40000
        let sample = decode_humidity_sample(&[0x00, 0x00, 0x42, 0x9C]).unwrap();
        let expected = -6.0 + 125.0 * 40000.0 / 65536.0;
        assert!(approx(sample.relative_humidity_pct, expected));
        assert!((sample.relative_humidity_pct - 70.29).abs() < 0.01);
    }

    #[test]
    fn humidity_count_39999_masks_to_39996() {
        let raw: u16 = 39999;
        let [lo, hi] = raw.to_le_bytes();
        let sample = decode_humidity_sample(&[0x00, 0x00, lo, hi]).unwrap();
        let expected = -6.0 + 125.0 * 39996.0 / 65536.0;
        assert!(approx(sample.relative_humidity_pct, expected));
        assert!((sample.relative_humidity_pct - 70.28).abs() < 0.01);
    }

    #[test]
    fn on_die_temperature_transfer_function() {
        let raw: u16 = 0x6000; // 24576
        let [lo, hi] = raw.to_le_bytes();
        let sample = decode_humidity_sample(&[lo, hi, 0x00, 0x00]).unwrap();
        assert!(approx(
            sample.on_die_temperature_c,
            -46.85 + 175.72 * 24576.0 / 65536.0
        ));
        assert!(approx(sample.relative_humidity_pct, -6.0));
        assert!(approx(
            sample.on_die_temperature_f(),
            sample.on_die_temperature_c * 1.8 + 32.0
        ));
    }

    #[test]
    fn short_payloads_are_rejected() {
        for len in 0..SAMPLE_LEN {
            let bytes = vec![0xAB; len];
            assert_eq!(
                decode_temperature_sample(&bytes),
                Err(CodecError::MalformedPayload { expected: 4, actual: len })
            );
            assert_eq!(
                decode_humidity_sample(&bytes),
                Err(CodecError::MalformedPayload { expected: 4, actual: len })
            );
        }
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let sample = decode_temperature_sample(&[0x00, 0x01, 0x00, 0x11, 0xFF, 0xFF]).unwrap();
        assert_eq!(sample.fahrenheit(), 93);
    }
}
