//! Capability interface between a sensor module and the host running it
//!
//! The host owns path registration, parameters and delivery. A sensor only
//! declares what it provides and hands values over.

use crate::InitError;

/// Services the host offers to a sensor
pub trait SensorHost {
    /// Declare a user-settable parameter (e.g. `zone`)
    fn add_default_param(&mut self, name: &str);

    /// Declare a value the sensor produces under `key`, with its default path
    fn add_default_path(&mut self, key: &str, path: &str);

    /// Deliver a value for a key registered with [`SensorHost::add_default_path`]
    fn emit(&mut self, key: &str, value: f64);
}

/// Lifecycle callbacks driven by the host
pub trait Sensor {
    /// Called once with the manufacturer data seen at discovery
    ///
    /// An error is fatal for this device; hosts must not retry.
    fn on_init(
        &mut self,
        host: &mut dyn SensorHost,
        manufacturer_data: Option<&[u8]>,
    ) -> Result<(), InitError>;

    /// Called on every manufacturer data change; returns the number of values emitted
    fn on_manufacturer_data_changed(
        &mut self,
        host: &mut dyn SensorHost,
        manufacturer_data: Option<&[u8]>,
    ) -> usize;
}
