// Collector config: JSON file written at registration time, read once per run

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default location of the config file used by the publish binary.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/simo/collector.conf";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the SIMO server, e.g. `https://simo.example.com`.
    #[serde(default)]
    pub server: String,
    /// Remote identifier of this host; blank until the host is registered.
    #[serde(default)]
    pub server_id: RemoteId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Local partition name (e.g. `sda1`) -> remote disk id.
    #[serde(default)]
    pub disk: BTreeMap<String, RemoteId>,
    /// Local interface name (e.g. `eth0`) -> remote network device id.
    #[serde(default, rename = "networkdevices")]
    pub network_devices: BTreeMap<String, RemoteId>,
    /// Mount points measured by the disk usage family.
    #[serde(default)]
    pub path_list: Vec<String>,
    /// Sampling window for CPU utilization.
    #[serde(default = "default_cpu_interval_secs")]
    pub cpu_interval_secs: u64,
}

fn default_cpu_interval_secs() -> u64 {
    3
}

/// Identifier assigned by the SIMO server at registration.
///
/// Registration stores whatever the server returned, usually a JSON number, so
/// both numbers and strings are accepted and sent back with their original type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Number(Number),
    Text(String),
}

impl Default for RemoteId {
    fn default() -> Self {
        RemoteId::Text(String::new())
    }
}

impl RemoteId {
    /// Blank text ids mean "not registered yet".
    pub fn is_empty(&self) -> bool {
        match self {
            RemoteId::Number(_) => false,
            RemoteId::Text(s) => s.trim().is_empty(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RemoteId::Number(n) => Value::Number(n.clone()),
            RemoteId::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<&str> for RemoteId {
    fn from(s: &str) -> Self {
        RemoteId::Text(s.to_string())
    }
}

impl From<u64> for RemoteId {
    fn from(n: u64) -> Self {
        RemoteId::Number(n.into())
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteId::Number(n) => write!(f, "{}", n),
            RemoteId::Text(s) => f.write_str(s),
        }
    }
}

/// A config key a sender may require before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigField {
    Server,
    ServerId,
    Username,
    Password,
    Disk,
    NetworkDevices,
    PathList,
}

impl ConfigField {
    /// Key name as it appears in the JSON file.
    pub fn key(&self) -> &'static str {
        match self {
            ConfigField::Server => "server",
            ConfigField::ServerId => "server_id",
            ConfigField::Username => "username",
            ConfigField::Password => "password",
            ConfigField::Disk => "disk",
            ConfigField::NetworkDevices => "networkdevices",
            ConfigField::PathList => "path_list",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Config {
    /// Read and parse the config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigMissing(path.to_path_buf()));
        }
        let s = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&s, path.to_path_buf())
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> Result<Self> {
        Self::parse(s, PathBuf::from("<inline>"))
    }

    fn parse(s: &str, path: PathBuf) -> Result<Self> {
        let config: Config =
            serde_json::from_str(s).map_err(|source| Error::ConfigParse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    // Family-independent checks only; required fields are checked per sender.
    fn validate(&self) -> Result<()> {
        if self.cpu_interval_secs == 0 {
            return Err(Error::ConfigInvalid(
                "cpu_interval_secs must be > 0, got 0".into(),
            ));
        }
        if !self.server.is_empty()
            && !(self.server.starts_with("http://") || self.server.starts_with("https://"))
        {
            return Err(Error::ConfigInvalid(format!(
                "server must be an http(s) URL, got {:?}",
                self.server
            )));
        }
        Ok(())
    }

    /// True when `field` is present and non-empty.
    pub fn has(&self, field: ConfigField) -> bool {
        match field {
            ConfigField::Server => !self.server.is_empty(),
            ConfigField::ServerId => !self.server_id.is_empty(),
            ConfigField::Username => !self.username.is_empty(),
            ConfigField::Password => !self.password.is_empty(),
            ConfigField::Disk => !self.disk.is_empty(),
            ConfigField::NetworkDevices => !self.network_devices.is_empty(),
            ConfigField::PathList => !self.path_list.is_empty(),
        }
    }

    /// The subset of `fields` that is absent or empty, in the given order.
    pub fn missing(&self, fields: &[ConfigField]) -> Vec<ConfigField> {
        fields.iter().copied().filter(|f| !self.has(*f)).collect()
    }
}
