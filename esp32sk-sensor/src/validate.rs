//! Plausibility ranges for the sensors fitted to the ESP32-SK board
//!
//! Values outside these ranges are still delivered unchanged; callers use the
//! checks to flag suspicious readings.

use std::ops::RangeInclusive;

use esp32sk_proto::Reading;

use crate::Field;

/// -40 °C to 85 °C, in kelvin
pub const TEMPERATURE_K: RangeInclusive<f64> = 233.15..=358.15;

/// 0 % to 100 %, as a ratio
pub const HUMIDITY_RATIO: RangeInclusive<f64> = 0.0..=1.0;

/// 300 hPa to 1100 hPa, in pascals
pub const PRESSURE_PA: RangeInclusive<f64> = 30_000.0..=110_000.0;

impl Field {
    pub fn plausible_range(self) -> RangeInclusive<f64> {
        match self {
            Field::Temperature => TEMPERATURE_K,
            Field::Humidity => HUMIDITY_RATIO,
            Field::Pressure => PRESSURE_PA,
        }
    }
}

pub fn is_plausible(field: Field, value: f64) -> bool {
    field.plausible_range().contains(&value)
}

/// Decoded fields of `reading` that fall outside their plausible range
pub fn out_of_range(reading: &Reading) -> Vec<(Field, f64)> {
    [
        (Field::Temperature, reading.temperature_k),
        (Field::Humidity, reading.humidity_ratio),
        (Field::Pressure, reading.pressure_pa),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.map(|v| (field, v)))
    .filter(|(field, value)| !is_plausible(*field, *value))
    .collect()
}
