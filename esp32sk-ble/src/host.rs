//! Host that writes emitted values as JSON lines

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use esp32sk_sensor::{Config, SensorHost, ZONE_PARAM};
use log::*;
use serde::Serialize;

/// One value on one path
#[derive(Debug, Serialize)]
pub struct Delta<'a> {
    pub device: &'a str,
    pub path: &'a str,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<&'a str>,
}

/// Per-device host: resolves registered keys to configured paths
pub struct JsonHost<W> {
    device: String,
    config: Arc<Config>,
    params: Vec<String>,
    paths: HashMap<String, String>,
    out: W,
}

impl<W: Write> JsonHost<W> {
    pub fn new(device: impl Into<String>, config: Arc<Config>, out: W) -> Self {
        Self {
            device: device.into(),
            config,
            params: Vec::new(),
            paths: HashMap::new(),
            out,
        }
    }

    /// Configured zone, once the sensor has asked for it
    fn zone(&self) -> Option<&str> {
        self.params
            .iter()
            .any(|p| p == ZONE_PARAM)
            .then(|| self.config.param(ZONE_PARAM))
            .flatten()
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.out
    }
}

impl<W: Write> SensorHost for JsonHost<W> {
    fn add_default_param(&mut self, name: &str) {
        self.params.push(name.to_string());
    }

    fn add_default_path(&mut self, key: &str, path: &str) {
        let path = self.config.path_for(key, path);
        debug!("{}: {key} -> {path}", self.device);
        self.paths.insert(key.to_string(), path);
    }

    fn emit(&mut self, key: &str, value: f64) {
        let Some(path) = self.paths.get(key) else {
            warn!("{}: value for unregistered key {key}", self.device);
            return;
        };
        let delta = Delta {
            device: &self.device,
            path,
            value,
            zone: self.zone(),
        };
        let line = match serde_json::to_string(&delta) {
            Ok(line) => line,
            Err(e) => {
                error!("failed to serialize delta: {e}");
                return;
            }
        };
        if let Err(e) = writeln!(self.out, "{line}") {
            error!("failed to write delta: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(host: JsonHost<Vec<u8>>) -> Vec<serde_json::Value> {
        String::from_utf8(host.into_output())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn emits_on_default_path() {
        let mut host = JsonHost::new("AA:BB", Arc::new(Config::default()), Vec::new());
        host.add_default_path("temperature", "environment.temperature");
        host.emit("temperature", 273.31);

        assert_eq!(
            lines(host),
            vec![serde_json::json!({
                "device": "AA:BB",
                "path": "environment.temperature",
                "value": 273.31,
            })]
        );
    }

    #[test]
    fn config_overrides_path_and_sets_zone() {
        let config = Config::from_json(
            r#"{ "zone": "inside", "paths": { "pressure": "environment.outside.pressure" } }"#,
        )
        .unwrap();
        let mut host = JsonHost::new("AA:BB", Arc::new(config), Vec::new());
        host.add_default_param("zone");
        host.add_default_path("pressure", "environment.pressure");
        host.emit("pressure", 100.0);

        assert_eq!(
            lines(host),
            vec![serde_json::json!({
                "device": "AA:BB",
                "path": "environment.outside.pressure",
                "value": 100.0,
                "zone": "inside",
            })]
        );
    }

    #[test]
    fn zone_needs_the_zone_param() {
        let config = Config::from_json(r#"{ "zone": "inside" }"#).unwrap();
        let mut host = JsonHost::new("AA:BB", Arc::new(config), Vec::new());
        host.add_default_param("label");
        host.add_default_path("humidity", "environment.humidity");
        host.emit("humidity", 0.5);
        host.add_default_param("zone");
        host.emit("humidity", 0.25);

        let lines = lines(host);
        assert_eq!(lines[0].get("zone"), None);
        assert_eq!(lines[1]["zone"], "inside");
    }

    #[test]
    fn unregistered_keys_are_dropped() {
        let mut host = JsonHost::new("AA:BB", Arc::new(Config::default()), Vec::new());
        host.emit("humidity", 0.5);
        assert!(lines(host).is_empty());
    }
}
