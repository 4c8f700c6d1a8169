//! Configuration file management for glidenav.
//!
//! Reads/writes `~/.glidenav/config.yaml` with the device declaration
//! (pressure-altitude source, heartbeat gate) and traffic aging windows.

use std::path::PathBuf;

use crate::session::SessionCaps;
use crate::traffic::{TrafficTable, TRAFFIC_PURGE_SEC, TRAFFIC_STALE_SEC};
use crate::types::NavError;

/// Full configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    pub device: DeviceConfig,
    pub traffic: TrafficConfig,
}

#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub name: String,
    /// This device is the declared pressure-altitude source.
    pub baro_source: bool,
    /// Pressure-altitude sentences ignored after attach before the value
    /// is trusted.
    pub baro_gate: u16,
}

#[derive(Debug, Clone)]
pub struct TrafficConfig {
    pub stale_after: f64,
    pub purge_after: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device: DeviceConfig {
                name: "gps0".into(),
                baro_source: true,
                baro_gate: 3,
            },
            traffic: TrafficConfig {
                stale_after: TRAFFIC_STALE_SEC,
                purge_after: TRAFFIC_PURGE_SEC,
            },
        }
    }
}

impl Config {
    /// Session capabilities declared by this configuration.
    pub fn session_caps(&self) -> SessionCaps {
        SessionCaps {
            baro_source: self.device.baro_source,
            baro_gate: self.device.baro_gate,
            vendor_position: false,
        }
    }

    /// A traffic table using the configured aging windows.
    pub fn traffic_table(&self) -> TrafficTable {
        TrafficTable::with_windows(self.traffic.stale_after, self.traffic.purge_after)
    }
}

/// Get the config directory path (`~/.glidenav/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".glidenav")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.glidenav/config.yaml`.
///
/// Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    let path = config_file();
    if !path.exists() {
        return Config::default();
    }

    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(_) => return Config::default(),
    };

    parse_config(&text).unwrap_or_default()
}

/// Save config to `~/.glidenav/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf, NavError> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir).map_err(|e| NavError::Config(e.to_string()))?;

    let path = config_file();
    let text = serialize_config(config);
    std::fs::write(&path, text).map_err(|e| NavError::Config(e.to_string()))?;

    Ok(path)
}

/// Parse simple YAML-like config text.
pub fn parse_config(text: &str) -> Option<Config> {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        if let Some((key, val)) = stripped.split_once(':') {
            let key = key.trim();
            let val = val.trim();

            if !is_indented {
                if val.is_empty() {
                    current_section = Some(key.to_string());
                } else {
                    current_section = None;
                }
            } else if let Some(ref section) = current_section {
                match section.as_str() {
                    "device" => match key {
                        "name" => {
                            if let Some(v) = parse_string_value(val) {
                                config.device.name = v;
                            }
                        }
                        "baro_source" => {
                            if let Some(v) = parse_bool_value(val) {
                                config.device.baro_source = v;
                            }
                        }
                        "baro_gate" => {
                            if let Ok(v) = val.parse::<u16>() {
                                config.device.baro_gate = v;
                            }
                        }
                        _ => {}
                    },
                    "traffic" => match key {
                        "stale_after" => {
                            if let Some(v) = parse_float_value(val) {
                                config.traffic.stale_after = v;
                            }
                        }
                        "purge_after" => {
                            if let Some(v) = parse_float_value(val) {
                                config.traffic.purge_after = v;
                            }
                        }
                        _ => {}
                    },
                    _ => {}
                }
            }
        }
    }

    Some(config)
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if (val.starts_with('"') && val.ends_with('"'))
        || (val.starts_with('\'') && val.ends_with('\''))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

fn parse_bool_value(val: &str) -> Option<bool> {
    match val {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_float_value(val: &str) -> Option<f64> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    val.parse().ok()
}

/// Serialize config to YAML-like text.
pub fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# glidenav configuration".to_string(), String::new()];

    lines.push("device:".into());
    lines.push(format!("  name: \"{}\"", config.device.name));
    lines.push(format!("  baro_source: {}", config.device.baro_source));
    lines.push(format!("  baro_gate: {}", config.device.baro_gate));
    lines.push(String::new());

    lines.push("traffic:".into());
    lines.push(format!("  stale_after: {}", config.traffic.stale_after));
    lines.push(format!("  purge_after: {}", config.traffic.purge_after));
    lines.push(String::new());

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.device.name, "gps0");
        assert!(config.device.baro_source);
        assert_eq!(config.device.baro_gate, 3);
        assert_eq!(config.traffic.stale_after, TRAFFIC_STALE_SEC);
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
device:
  name: "vario-link"
  baro_source: false
  baro_gate: 5

traffic:
  stale_after: 10.0
  purge_after: 20.0
"#;
        let config = parse_config(text).unwrap();
        assert_eq!(config.device.name, "vario-link");
        assert!(!config.device.baro_source);
        assert_eq!(config.device.baro_gate, 5);
        assert_eq!(config.traffic.stale_after, 10.0);
        assert_eq!(config.traffic.purge_after, 20.0);
    }

    #[test]
    fn test_parse_config_partial_keeps_defaults() {
        let text = "device:\n  name: \"x\"\n";
        let config = parse_config(text).unwrap();
        assert_eq!(config.device.name, "x");
        assert!(config.device.baro_source);
        assert_eq!(config.traffic.purge_after, TRAFFIC_PURGE_SEC);
    }

    #[test]
    fn test_roundtrip() {
        let config = Config {
            device: DeviceConfig {
                name: "test".into(),
                baro_source: false,
                baro_gate: 7,
            },
            traffic: TrafficConfig {
                stale_after: 12.5,
                purge_after: 25.0,
            },
        };
        let text = serialize_config(&config);
        let parsed = parse_config(&text).unwrap();
        assert_eq!(parsed.device.name, "test");
        assert!(!parsed.device.baro_source);
        assert_eq!(parsed.device.baro_gate, 7);
        assert_eq!(parsed.traffic.stale_after, 12.5);
        assert_eq!(parsed.traffic.purge_after, 25.0);
    }

    #[test]
    fn test_session_caps_mapping() {
        let mut config = Config::default();
        config.device.baro_source = false;
        config.device.baro_gate = 9;
        let caps = config.session_caps();
        assert!(!caps.baro_source);
        assert_eq!(caps.baro_gate, 9);
        assert!(!caps.vendor_position);
    }
}
