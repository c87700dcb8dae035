use esp32sk_proto::{decode_humidity_ratio, decode_pressure_pa, decode_temperature_k};

/// A value the ESP32-SK provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Kelvin
    Temperature,
    /// Ratio, 1.0 = 100 %
    Humidity,
    /// Pascals
    Pressure,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Temperature, Field::Humidity, Field::Pressure];

    pub fn key(self) -> &'static str {
        match self {
            Field::Temperature => "temperature",
            Field::Humidity => "humidity",
            Field::Pressure => "pressure",
        }
    }

    pub fn default_path(self) -> &'static str {
        match self {
            Field::Temperature => "environment.temperature",
            Field::Humidity => "environment.humidity",
            Field::Pressure => "environment.pressure",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Decode this field from a manufacturer payload
    pub fn read(self, buffer: Option<&[u8]>) -> Option<f64> {
        match self {
            Field::Temperature => decode_temperature_k(buffer),
            Field::Humidity => decode_humidity_ratio(buffer),
            Field::Pressure => decode_pressure_pa(buffer),
        }
    }
}
