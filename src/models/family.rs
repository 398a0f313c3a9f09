// Metric families and the remote endpoint table

use std::fmt;

use crate::error::{Error, Result};

/// Remote path for every endpoint the SIMO server exposes to collectors.
/// `server`, `disk` and `network-device` are used by host registration only.
const URL_LIST: &[(&str, &str)] = &[
    ("memory", "/api/memory/"),
    ("loadavg", "/api/load-avg/"),
    ("cpu", "/api/cpu-utilization/"),
    ("diskusage", "/api/disk-usage/"),
    ("diskio", "/api/disk-io/"),
    ("networktraffic", "/api/network-traffic/"),
    ("server", "/api/server/"),
    ("disk", "/api/disk/"),
    ("network-device", "/api/network-device/"),
];

/// Look up the remote path for an endpoint name.
pub fn url_path(name: &str) -> Result<&'static str> {
    URL_LIST
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, path)| *path)
        .ok_or_else(|| Error::UnsupportedFamily(name.to_string()))
}

/// Join the configured base URL and the endpoint path for `name`.
pub fn endpoint_url(server: &str, name: &str) -> Result<String> {
    Ok(format!("{}{}", server.trim_end_matches('/'), url_path(name)?))
}

/// One publishable category of sampled data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricFamily {
    Memory,
    LoadAvg,
    Cpu,
    DiskUsage,
    DiskIo,
    NetworkTraffic,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 6] = [
        MetricFamily::Memory,
        MetricFamily::LoadAvg,
        MetricFamily::Cpu,
        MetricFamily::DiskUsage,
        MetricFamily::DiskIo,
        MetricFamily::NetworkTraffic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MetricFamily::Memory => "memory",
            MetricFamily::LoadAvg => "loadavg",
            MetricFamily::Cpu => "cpu",
            MetricFamily::DiskUsage => "diskusage",
            MetricFamily::DiskIo => "diskio",
            MetricFamily::NetworkTraffic => "networktraffic",
        }
    }

    pub fn url_path(&self) -> &'static str {
        // Every family has an entry in URL_LIST.
        url_path(self.name()).unwrap_or("/")
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
