//! ESP32-SK sensor module
//!
//! Turns the manufacturer data broadcast by the ESP32-SK environmental board
//! into values on named data paths.
//!
//! This crate provides:
//! - the capability interface between a sensor and its host ([`SensorHost`], [`Sensor`])
//! - the [`Esp32Sk`] sensor and its [`Field`] table
//! - plausibility checks, configuration, and a per-device [`Monitor`] loop
//!
//! # Example
//!
//! ```ignore
//! use esp32sk_sensor::{Esp32Sk, Sensor};
//!
//! let mut sensor = Esp32Sk::default();
//! sensor.on_init(&mut host, Some(&payload))?;
//! sensor.on_manufacturer_data_changed(&mut host, Some(&payload));
//! ```

mod config;
mod field;
mod host;
mod monitor;
mod sensor;
pub mod validate;

pub use config::{Config, ConfigError, esp32sk_home};
pub use field::Field;
pub use host::{Sensor, SensorHost};
pub use monitor::{Monitor, Outcome};
pub use sensor::{Esp32Sk, InitError, MIN_INIT_LEN, ZONE_PARAM};

pub use esp32sk_proto::{DEFAULT_COMPANY_ID, Reading};
