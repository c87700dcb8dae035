//! The ESP32-SK environmental sensor

use esp32sk_proto::{DEFAULT_COMPANY_ID, PAYLOAD_LEN};
use log::*;

use crate::{Field, Sensor, SensorHost, validate};

/// Manufacturer data needed to set the sensor up
pub const MIN_INIT_LEN: usize = PAYLOAD_LEN;

/// Parameter the sensor asks the host to expose
pub const ZONE_PARAM: &str = "zone";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    #[error("ESP32-SK: missing manufacturer data")]
    MissingData,
    #[error("ESP32-SK: manufacturer data too short ({len} bytes, need {min})")]
    TooShort { len: usize, min: usize },
}

/// Decoder for one ESP32-SK board
///
/// Holds no measurement state: every update decodes the buffer it is given.
#[derive(Debug, Clone)]
pub struct Esp32Sk {
    manufacturer_id: u16,
    initialized: bool,
}

impl Default for Esp32Sk {
    fn default() -> Self {
        Self::new(DEFAULT_COMPANY_ID)
    }
}

impl Esp32Sk {
    pub fn new(manufacturer_id: u16) -> Self {
        Self {
            manufacturer_id,
            initialized: false,
        }
    }

    pub fn manufacturer_id(&self) -> u16 {
        self.manufacturer_id
    }

    /// Whether a device advertising `manufacturer_id` is one of ours
    pub fn identify(&self, manufacturer_id: u16) -> bool {
        manufacturer_id == self.manufacturer_id
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn emit_values_from(&self, host: &mut dyn SensorHost, buffer: Option<&[u8]>) -> usize {
        let mut emitted = 0;
        for field in Field::ALL {
            let Some(value) = field.read(buffer) else {
                continue;
            };
            if !validate::is_plausible(field, value) {
                warn!("ESP32-SK: {} out of range: {value}", field.key());
            }
            host.emit(field.key(), value);
            emitted += 1;
        }
        emitted
    }
}

impl Sensor for Esp32Sk {
    fn on_init(
        &mut self,
        host: &mut dyn SensorHost,
        manufacturer_data: Option<&[u8]>,
    ) -> Result<(), InitError> {
        let data = manufacturer_data.ok_or(InitError::MissingData)?;
        if data.len() < MIN_INIT_LEN {
            return Err(InitError::TooShort {
                len: data.len(),
                min: MIN_INIT_LEN,
            });
        }

        host.add_default_param(ZONE_PARAM);
        for field in Field::ALL {
            host.add_default_path(field.key(), field.default_path());
        }

        self.initialized = true;
        info!("ESP32-SK: initialized (manufacturer id {:#06x})", self.manufacturer_id);
        Ok(())
    }

    fn on_manufacturer_data_changed(
        &mut self,
        host: &mut dyn SensorHost,
        manufacturer_data: Option<&[u8]>,
    ) -> usize {
        if !self.initialized {
            debug!("ESP32-SK: update before init, ignoring");
            return 0;
        }
        self.emit_values_from(host, manufacturer_data)
    }
}
