//! Configuration - stored as JSON in ESP32SK_HOME

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use esp32sk_proto::DEFAULT_COMPANY_ID;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{Field, ZONE_PARAM};

const CONFIG_FILE: &str = "config.json";

/// Get ESP32SK_HOME directory (`~/.esp32sk` unless overridden)
pub fn esp32sk_home() -> Option<PathBuf> {
    std::env::var("ESP32SK_HOME")
        .map(PathBuf::from)
        .ok()
        .or_else(|| dirs::home_dir().map(|home| home.join(".esp32sk")))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown path key in config: {0}")]
    UnknownPathKey(String),
    #[error("could not determine ESP32SK_HOME")]
    NoHome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Company identifier the boards advertise with
    pub manufacturer_id: u16,
    /// Value for the `zone` parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Path overrides, keyed by field key (`temperature`, `humidity`, `pressure`)
    pub paths: BTreeMap<String, String>,
    /// Scan duration in seconds
    pub scan_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manufacturer_id: DEFAULT_COMPANY_ID,
            zone: None,
            paths: BTreeMap::new(),
            scan_secs: 5,
        }
    }
}

impl Config {
    /// `$ESP32SK_HOME/config.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        esp32sk_home()
            .map(|home| home.join(CONFIG_FILE))
            .ok_or(ConfigError::NoHome)
    }

    /// Load config from file, or defaults if the file does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(data)?;
        if let Some(key) = config.paths.keys().find(|k| Field::from_key(k).is_none()) {
            return Err(ConfigError::UnknownPathKey(key.clone()));
        }
        Ok(config)
    }

    /// Save config to file, creating the parent directory
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Configured path for `key`, falling back to the sensor's default
    pub fn path_for(&self, key: &str, default: &str) -> String {
        self.paths
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    /// Value of a registered parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        match name {
            ZONE_PARAM => self.zone.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.manufacturer_id, 0xFFFF);
        assert_eq!(config.scan_secs, 5);
    }

    #[test]
    fn overrides() {
        let config = Config::from_json(
            r#"{
                "manufacturer_id": 741,
                "zone": "inside",
                "paths": { "pressure": "environment.outside.pressure" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.manufacturer_id, 741);
        assert_eq!(config.param("zone"), Some("inside"));
        assert_eq!(config.param("offset"), None);
        assert_eq!(
            config.path_for("pressure", "environment.pressure"),
            "environment.outside.pressure"
        );
        assert_eq!(
            config.path_for("temperature", "environment.temperature"),
            "environment.temperature"
        );
    }

    #[test]
    fn unknown_path_key_is_rejected() {
        let err = Config::from_json(r#"{ "paths": { "voltage": "electrical.voltage" } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPathKey(k) if k == "voltage"));
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        assert!(matches!(
            Config::from_json(r#"{ "manufacturer_id": 70000 }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("esp32sk-no-such-dir").join(CONFIG_FILE);
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("esp32sk-config-{}", std::process::id()));
        let path = dir.join(CONFIG_FILE);
        let config = Config {
            zone: Some("cabin".to_string()),
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
        fs::remove_dir_all(&dir).unwrap();
    }
}
