//! Manufacturer payload broadcast by the ESP32-SK firmware
//!
//! Layout, little-endian:
//!
//! | offset | size | field                       |
//! |--------|------|-----------------------------|
//! | 0      | 1    | format version              |
//! | 1      | 2    | temperature, i16, 0.01 °C   |
//! | 3      | 2    | humidity, u16, 0.01 %       |
//! | 5      | 4    | pressure, u32, 0.1 Pa       |
//! | 9      | 1    | battery, u8, %              |

use std::io;

/// Length of a complete payload
pub const PAYLOAD_LEN: usize = 10;

/// Format version written by the firmware
pub const PAYLOAD_VERSION: u8 = 0x01;

// Field offsets
pub const VERSION_OFFSET: usize = 0;
pub const TEMPERATURE_OFFSET: usize = 1;
pub const HUMIDITY_OFFSET: usize = 3;
pub const PRESSURE_OFFSET: usize = 5;
pub const BATTERY_OFFSET: usize = 9;

/// 0 °C in hundredths of a kelvin
const ZERO_CELSIUS_CENTI_K: i32 = 27_315;

/// Temperature in kelvin, 2 decimals. `None` below 3 bytes.
pub fn decode_temperature_k(buffer: Option<&[u8]>) -> Option<f64> {
    let raw = read_i16_le(buffer?, TEMPERATURE_OFFSET)?;
    // Summing in hundredths keeps the result the closest f64 to the 2 decimal value
    Some(f64::from(ZERO_CELSIUS_CENTI_K + i32::from(raw)) / 100.0)
}

/// Relative humidity as a ratio, 4 decimals. `None` below 5 bytes.
///
/// Not clamped: a raw value above 10000 yields a ratio above 1.
pub fn decode_humidity_ratio(buffer: Option<&[u8]>) -> Option<f64> {
    let raw = read_u16_le(buffer?, HUMIDITY_OFFSET)?;
    Some(f64::from(raw) / 10_000.0)
}

/// Pressure in pascals, 1 decimal. `None` below 9 bytes.
pub fn decode_pressure_pa(buffer: Option<&[u8]>) -> Option<f64> {
    let raw = read_u32_le(buffer?, PRESSURE_OFFSET)?;
    Some(f64::from(raw) / 10.0)
}

fn read_i16_le(data: &[u8], offset: usize) -> Option<i16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(i16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u16_le(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Decoded measurements, each field independent of the others
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    pub temperature_k: Option<f64>,
    pub humidity_ratio: Option<f64>,
    pub pressure_pa: Option<f64>,
}

impl Reading {
    /// Run all three decoders over the same buffer
    pub fn decode(buffer: Option<&[u8]>) -> Self {
        Self {
            temperature_k: decode_temperature_k(buffer),
            humidity_ratio: decode_humidity_ratio(buffer),
            pressure_pa: decode_pressure_pa(buffer),
        }
    }

    pub fn temperature_celsius(&self) -> Option<f64> {
        self.temperature_k
            .map(|k| ((k * 100.0).round() - f64::from(ZERO_CELSIUS_CENTI_K)) / 100.0)
    }

    pub fn humidity_percent(&self) -> Option<f64> {
        self.humidity_ratio.map(|r| (r * 10_000.0).round() / 100.0)
    }

    /// True when no field could be decoded
    pub fn is_empty(&self) -> bool {
        self.temperature_k.is_none() && self.humidity_ratio.is_none() && self.pressure_pa.is_none()
    }
}

/// Raw payload fields, in wire units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload {
    pub version: u8,
    pub temperature_centi_c: i16,
    pub humidity_centi_pct: u16,
    pub pressure_deci_pa: u32,
    pub battery_pct: u8,
}

impl Payload {
    /// Payload in the firmware's layout, built from sensor readings
    ///
    /// Missing measurements are encoded as zero and the battery is reported
    /// full. Unlike the firmware, which truncates scaled values and fails on
    /// overflow, scaled values are rounded to the nearest unit and saturate at
    /// the bounds of their wire type.
    pub fn from_measurements(
        celsius: Option<f64>,
        percent: Option<f64>,
        pascals: Option<f64>,
    ) -> Self {
        // `as` from f64 saturates, NaN becomes 0
        Self {
            version: PAYLOAD_VERSION,
            temperature_centi_c: celsius.map_or(0, |c| (c * 100.0).round() as i16),
            humidity_centi_pct: percent.map_or(0, |p| (p * 100.0).round() as u16),
            pressure_deci_pa: pascals.map_or(0, |p| (p * 10.0).round() as u32),
            battery_pct: 100,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(PAYLOAD_LEN);
        buf.push(self.version);
        buf.extend_from_slice(&self.temperature_centi_c.to_le_bytes());
        buf.extend_from_slice(&self.humidity_centi_pct.to_le_bytes());
        buf.extend_from_slice(&self.pressure_deci_pa.to_le_bytes());
        buf.push(self.battery_pct);
        buf
    }

    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        if data.len() < PAYLOAD_LEN {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "payload too short"));
        }
        Ok(Self {
            version: data[VERSION_OFFSET],
            temperature_centi_c: i16::from_le_bytes([data[1], data[2]]),
            humidity_centi_pct: u16::from_le_bytes([data[3], data[4]]),
            pressure_deci_pa: u32::from_le_bytes([data[5], data[6], data[7], data[8]]),
            battery_pct: data[BATTERY_OFFSET],
        })
    }

    pub fn reading(&self) -> Reading {
        Reading::decode(Some(self.to_bytes().as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [u8; 10] = [0x01, 0x10, 0x00, 0x20, 0x4E, 0xE8, 0x03, 0x00, 0x00, 0x64];

    #[test]
    fn decodes_sample_payload() {
        let buf = Some(&SAMPLE[..]);
        assert_eq!(decode_temperature_k(buf), Some(273.31));
        // 200 %, passed through unclamped
        assert_eq!(decode_humidity_ratio(buf), Some(2.0));
        assert_eq!(decode_pressure_pa(buf), Some(100.0));
    }

    #[test]
    fn negative_temperature() {
        let buf: [u8; 3] = [0x01, 0x9C, 0xFF];
        assert_eq!(decode_temperature_k(Some(&buf)), Some(272.15));
    }

    #[test]
    fn temperature_extremes() {
        assert_eq!(decode_temperature_k(Some(&[0x00u8, 0x00, 0x80][..])), Some(-54.53));
        assert_eq!(decode_temperature_k(Some(&[0x00u8, 0xFF, 0x7F][..])), Some(600.82));
    }

    #[test]
    fn absent_buffer() {
        assert_eq!(Reading::decode(None), Reading::default());
        assert!(Reading::decode(None).is_empty());
    }

    #[test]
    fn length_thresholds_are_per_field() {
        let four = &SAMPLE[..4];
        assert_eq!(decode_temperature_k(Some(four)), Some(273.31));
        assert_eq!(decode_humidity_ratio(Some(four)), None);
        assert_eq!(decode_pressure_pa(Some(four)), None);

        assert_eq!(decode_temperature_k(Some(&SAMPLE[..2])), None);
        assert_eq!(decode_humidity_ratio(Some(&SAMPLE[..5])), Some(2.0));
        assert_eq!(decode_pressure_pa(Some(&SAMPLE[..8])), None);

        let nine = Reading::decode(Some(&SAMPLE[..9]));
        assert_eq!(nine, Reading::decode(Some(&SAMPLE)));
    }

    #[test]
    fn humidity_keeps_four_decimals() {
        let raw = 12345u16.to_le_bytes();
        let buf = [0x01, 0x00, 0x00, raw[0], raw[1]];
        assert_eq!(decode_humidity_ratio(Some(&buf)), Some(1.2345));
    }

    #[test]
    fn pressure_keeps_one_decimal() {
        let raw = 1_013_257u32.to_le_bytes();
        let buf = [0x01, 0, 0, 0, 0, raw[0], raw[1], raw[2], raw[3]];
        assert_eq!(decode_pressure_pa(Some(&buf)), Some(101_325.7));
    }

    #[test]
    fn decoding_is_repeatable() {
        let first = Reading::decode(Some(&SAMPLE));
        let second = Reading::decode(Some(&SAMPLE));
        assert_eq!(first, second);
    }

    #[test]
    fn reading_unit_helpers() {
        let reading = Reading::decode(Some(&SAMPLE));
        assert_eq!(reading.temperature_celsius(), Some(0.16));
        assert_eq!(reading.humidity_percent(), Some(200.0));
    }

    #[test]
    fn payload_from_measurements() {
        let payload = Payload::from_measurements(Some(22.35), Some(45.5), Some(101_325.0));
        assert_eq!(payload.version, PAYLOAD_VERSION);
        assert_eq!(payload.temperature_centi_c, 2235);
        assert_eq!(payload.humidity_centi_pct, 4550);
        assert_eq!(payload.pressure_deci_pa, 1_013_250);
        assert_eq!(payload.battery_pct, 100);

        let reading = payload.reading();
        assert_eq!(reading.temperature_k, Some(295.5));
        assert_eq!(reading.humidity_ratio, Some(0.455));
        assert_eq!(reading.pressure_pa, Some(101_325.0));
    }

    #[test]
    fn missing_measurements_encode_as_zero() {
        let bytes = Payload::from_measurements(None, None, None).to_bytes();
        assert_eq!(bytes, vec![0x01, 0, 0, 0, 0, 0, 0, 0, 0, 100]);
    }

    #[test]
    fn measurements_round_to_nearest_unit() {
        // truncating 0.29 * 100 would give 28
        let payload = Payload::from_measurements(Some(0.29), Some(33.339), Some(99_999.96));
        assert_eq!(payload.temperature_centi_c, 29);
        assert_eq!(payload.humidity_centi_pct, 3334);
        assert_eq!(payload.pressure_deci_pa, 1_000_000);
    }

    #[test]
    fn out_of_range_measurements_saturate() {
        let payload = Payload::from_measurements(Some(500.0), Some(-3.0), Some(f64::NAN));
        assert_eq!(payload.temperature_centi_c, i16::MAX);
        assert_eq!(payload.humidity_centi_pct, 0);
        assert_eq!(payload.pressure_deci_pa, 0);
    }

    #[test]
    fn payload_bytes() {
        let payload = Payload::from_bytes(&SAMPLE).unwrap();
        assert_eq!(payload.temperature_centi_c, 16);
        assert_eq!(payload.humidity_centi_pct, 20_000);
        assert_eq!(payload.pressure_deci_pa, 1000);
        assert_eq!(payload.battery_pct, 100);
        assert_eq!(payload.to_bytes(), SAMPLE.to_vec());

        let err = Payload::from_bytes(&SAMPLE[..9]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn reading_serializes_missing_fields_as_null() {
        let reading = Reading::decode(Some(&SAMPLE[..4]));
        let json = serde_json::to_value(reading).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "temperature_k": 273.31,
                "humidity_ratio": null,
                "pressure_pa": null,
            })
        );
    }
}
