//! Handler configuration.
//!
//! Loads a small JSON config. The first existing file among
//! `$HOTPLUG_NETCONF_CONFIG`, `/etc/hotplug-netconf/config.json` and
//! `~/.config/hotplug-netconf/config.json` wins. A missing file means defaults;
//! a malformed one is an error, since guessing here would rewrite the wrong lines.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{NetconfError, Result};
use crate::event::INTERFACE_VARS;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "HOTPLUG_NETCONF_CONFIG";

const SYSTEM_CONFIG: &str = "/etc/hotplug-netconf/config.json";

/// An interface the handler reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InterfaceConfig {
    /// Kernel interface name (e.g. "wlan0").
    pub name: String,
    /// Variable the event source reports this interface in: `IFACE` for
    /// ifupdown hooks, `INTERFACE` for udev.
    #[serde(default = "default_env_var")]
    pub env_var: String,
    /// Third octet of the 192.168.x.0/24 network served on this interface.
    pub subnet: u8,
    /// Access-point interfaces get hostapd and manual address handling.
    #[serde(default)]
    pub wireless: bool,
}

/// Persisted handler settings.
///
/// Every field has a serde default so that a partial file only overrides
/// what it names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tor configuration file holding the TransPort/DNSPort lines.
    pub torrc_path: PathBuf,
    /// Lock file serializing concurrent invocations.
    pub lock_path: PathBuf,
    pub service_bin: PathBuf,
    pub ip_bin: PathBuf,
    pub dhcp_service: String,
    pub ap_service: String,
    pub trans_port: u16,
    pub dns_port: u16,
    /// Seconds to wait after starting the AP daemon before touching the interface.
    pub ap_settle_secs: u64,
    pub interfaces: Vec<InterfaceConfig>,
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub log_level: String,
    /// Append logs here instead of stderr.
    pub log_file: Option<PathBuf>,
}

fn default_env_var() -> String {
    "INTERFACE".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            torrc_path: PathBuf::from("/etc/tor/torrc"),
            lock_path: PathBuf::from("/tmp/hotplug-netconf.lock"),
            service_bin: PathBuf::from("/usr/sbin/service"),
            ip_bin: PathBuf::from("/bin/ip"),
            dhcp_service: "isc-dhcp-server".to_string(),
            ap_service: "hostapd".to_string(),
            trans_port: 9040,
            dns_port: 5353,
            ap_settle_secs: 10,
            interfaces: vec![
                InterfaceConfig {
                    name: "eth1".to_string(),
                    env_var: "IFACE".to_string(),
                    subnet: 43,
                    wireless: false,
                },
                InterfaceConfig {
                    name: "wlan0".to_string(),
                    env_var: "INTERFACE".to_string(),
                    subnet: 42,
                    wireless: true,
                },
            ],
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Candidate config paths in lookup order.
    pub fn candidates() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
            paths.push(PathBuf::from(explicit));
        }
        paths.push(PathBuf::from(SYSTEM_CONFIG));
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("hotplug-netconf").join("config.json"));
        }
        paths
    }

    /// Load from the first existing candidate, or defaults if none exists.
    ///
    /// Returns the path that was used alongside the config.
    pub fn load() -> Result<(Self, Option<PathBuf>)> {
        for path in Self::candidates() {
            if let Some(config) = Self::load_from(&path)? {
                return Ok((config, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }

    /// Load a single file. `Ok(None)` when it does not exist.
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(NetconfError::Config {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };

        let config: Self =
            serde_json::from_str(&contents).map_err(|e| NetconfError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validate(path)?;
        Ok(Some(config))
    }

    fn validate(&self, path: &Path) -> Result<()> {
        for (i, iface) in self.interfaces.iter().enumerate() {
            if iface.name.is_empty() {
                return Err(NetconfError::Config {
                    path: path.to_path_buf(),
                    message: format!("interfaces[{}] has an empty name", i),
                });
            }
            if !INTERFACE_VARS.contains(&iface.env_var.as_str()) {
                return Err(NetconfError::Config {
                    path: path.to_path_buf(),
                    message: format!(
                        "interface {}: env_var must be one of {:?}",
                        iface.name, INTERFACE_VARS
                    ),
                });
            }
            let earlier = &self.interfaces[..i];
            if earlier.iter().any(|other| other.name == iface.name) {
                return Err(NetconfError::Config {
                    path: path.to_path_buf(),
                    message: format!("interface {} listed twice", iface.name),
                });
            }
            // Two interfaces on one subnet would fight over the same torrc lines
            if earlier.iter().any(|other| other.subnet == iface.subnet) {
                return Err(NetconfError::Config {
                    path: path.to_path_buf(),
                    message: format!("subnet {} bound to more than one interface", iface.subnet),
                });
            }
        }
        Ok(())
    }

    pub fn ap_settle(&self) -> Duration {
        Duration::from_secs(self.ap_settle_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "torrc_path": "/tmp/torrc", "ap_settle_secs": 3 }"#).unwrap();

        let config = Config::load_from(&path).unwrap().unwrap();
        assert_eq!(config.torrc_path, PathBuf::from("/tmp/torrc"));
        assert_eq!(config.ap_settle(), Duration::from_secs(3));
        assert_eq!(config.dhcp_service, "isc-dhcp-server");
        assert_eq!(config.interfaces.len(), 2);
    }

    #[test]
    fn test_interfaces_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "interfaces": [ { "name": "usb0", "subnet": 44 } ] }"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap().unwrap();
        assert_eq!(
            config.interfaces,
            vec![InterfaceConfig {
                name: "usb0".to_string(),
                env_var: "INTERFACE".to_string(),
                subnet: 44,
                wireless: false,
            }]
        );
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, NetconfError::Config { .. }));
    }

    #[test]
    fn test_duplicate_interface_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "interfaces": [
                { "name": "wlan0", "subnet": 42, "wireless": true },
                { "name": "wlan0", "subnet": 45 }
            ] }"#,
        )
        .unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_duplicate_subnet_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "interfaces": [
                { "name": "wlan0", "subnet": 42, "wireless": true },
                { "name": "usb0", "env_var": "IFACE", "subnet": 42 }
            ] }"#,
        )
        .unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("subnet 42"));
    }

    #[test]
    fn test_unknown_env_var_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "interfaces": [ { "name": "usb0", "env_var": "DEVICE", "subnet": 44 } ] }"#,
        )
        .unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
