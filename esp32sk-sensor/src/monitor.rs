//! Per-device host loop: routes advertisements to one sensor per device

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use log::*;

use crate::{Esp32Sk, InitError, Sensor, SensorHost};

/// What happened to an advertisement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No manufacturer data for the configured company id
    NotOurs,
    /// First sighting, sensor set up and initial values emitted
    Initialized { emitted: usize },
    Updated { emitted: usize },
    /// First sighting, setup failed; the device is ignored from now on
    Failed(InitError),
    /// Device failed setup earlier
    Rejected,
}

enum Slot<H> {
    Active { sensor: Esp32Sk, host: H },
    Rejected,
}

/// Tracks ESP32-SK devices seen in advertisements
///
/// Each device gets its own sensor and its own host, built by `new_host` on
/// first sighting.
pub struct Monitor<K, H> {
    manufacturer_id: u16,
    new_host: Box<dyn FnMut(&K) -> H>,
    devices: HashMap<K, Slot<H>>,
}

impl<K, H> Monitor<K, H>
where
    K: Eq + Hash + Clone + Debug,
    H: SensorHost,
{
    pub fn new(manufacturer_id: u16, new_host: impl FnMut(&K) -> H + 'static) -> Self {
        Self {
            manufacturer_id,
            new_host: Box::new(new_host),
            devices: HashMap::new(),
        }
    }

    /// Handle manufacturer data from one advertisement, keyed by company id
    pub fn handle(&mut self, device: &K, manufacturer_data: &HashMap<u16, Vec<u8>>) -> Outcome {
        let Some(data) = manufacturer_data.get(&self.manufacturer_id) else {
            return Outcome::NotOurs;
        };
        let data = Some(data.as_slice());

        match self.devices.get_mut(device) {
            Some(Slot::Rejected) => Outcome::Rejected,
            Some(Slot::Active { sensor, host }) => Outcome::Updated {
                emitted: sensor.on_manufacturer_data_changed(host, data),
            },
            None => {
                let mut sensor = Esp32Sk::new(self.manufacturer_id);
                let mut host = (self.new_host)(device);
                match sensor.on_init(&mut host, data) {
                    Ok(()) => {
                        info!("{device:?}: new ESP32-SK device");
                        let emitted = sensor.on_manufacturer_data_changed(&mut host, data);
                        self.devices
                            .insert(device.clone(), Slot::Active { sensor, host });
                        Outcome::Initialized { emitted }
                    }
                    Err(e) => {
                        warn!("{device:?}: {e}, ignoring device");
                        self.devices.insert(device.clone(), Slot::Rejected);
                        Outcome::Failed(e)
                    }
                }
            }
        }
    }

    /// Host of an active device
    pub fn host(&self, device: &K) -> Option<&H> {
        match self.devices.get(device) {
            Some(Slot::Active { host, .. }) => Some(host),
            _ => None,
        }
    }

    pub fn active_count(&self) -> usize {
        self.devices
            .values()
            .filter(|slot| matches!(slot, Slot::Active { .. }))
            .count()
    }
}
