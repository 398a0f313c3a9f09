// Shared test helpers: scripted collector, recording transport, config fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use simocollector::collector::Collector;
use simocollector::config::Config;
use simocollector::models::{MetricSnapshot, Record};
use simocollector::transport::{PublishRequest, Transport};
use simocollector::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const BASE_CONFIG: &str = r#"{
    "server": "http://h",
    "server_id": "S",
    "username": "u",
    "password": "p"
}"#;

pub const FULL_CONFIG: &str = r#"{
    "server": "http://h/",
    "server_id": "S",
    "username": "u",
    "password": "p",
    "disk": {"sda1": "d1", "sdb1": "d2", "sdc1": "d3"},
    "networkdevices": {"eth0": "n1"},
    "path_list": ["/"]
}"#;

pub fn base_config() -> Config {
    Config::load_from_str(BASE_CONFIG).expect("base config")
}

pub fn full_config() -> Config {
    Config::load_from_str(FULL_CONFIG).expect("full config")
}

pub fn record(v: Value) -> Record {
    v.as_object().cloned().expect("object")
}

pub fn multi(rows: Vec<(&str, Value)>) -> MetricSnapshot {
    MetricSnapshot::Multi(
        rows.into_iter()
            .map(|(k, v)| (k.to_string(), record(v)))
            .collect::<BTreeMap<_, _>>(),
    )
}

/// Returns the same snapshot for every family and counts calls.
pub struct FakeCollector {
    snapshot: MetricSnapshot,
    pub calls: AtomicUsize,
    pub last_path_list: Mutex<Vec<String>>,
}

impl FakeCollector {
    pub fn single(v: Value) -> Self {
        Self::new(MetricSnapshot::Single(record(v)))
    }

    pub fn new(snapshot: MetricSnapshot) -> Self {
        Self {
            snapshot,
            calls: AtomicUsize::new(0),
            last_path_list: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn read(&self) -> anyhow::Result<MetricSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.clone())
    }
}

#[async_trait]
impl Collector for FakeCollector {
    async fn memory(&self) -> anyhow::Result<MetricSnapshot> {
        self.read()
    }

    async fn load_average(&self) -> anyhow::Result<MetricSnapshot> {
        self.read()
    }

    async fn cpu_utilization(&self, _interval: Duration) -> anyhow::Result<MetricSnapshot> {
        self.read()
    }

    async fn disk_usage(&self, path_list: &[String]) -> anyhow::Result<MetricSnapshot> {
        *self.last_path_list.lock().unwrap() = path_list.to_vec();
        self.read()
    }

    async fn disk_io(&self) -> anyhow::Result<MetricSnapshot> {
        self.read()
    }

    async fn network_traffic(&self) -> anyhow::Result<MetricSnapshot> {
        self.read()
    }
}

/// A collector whose every read fails.
pub struct FailingCollector;

#[async_trait]
impl Collector for FailingCollector {
    async fn memory(&self) -> anyhow::Result<MetricSnapshot> {
        anyhow::bail!("no /proc")
    }

    async fn load_average(&self) -> anyhow::Result<MetricSnapshot> {
        anyhow::bail!("no /proc")
    }

    async fn cpu_utilization(&self, _interval: Duration) -> anyhow::Result<MetricSnapshot> {
        anyhow::bail!("no /proc")
    }

    async fn disk_usage(&self, _path_list: &[String]) -> anyhow::Result<MetricSnapshot> {
        anyhow::bail!("no /proc")
    }

    async fn disk_io(&self) -> anyhow::Result<MetricSnapshot> {
        anyhow::bail!("no /proc")
    }

    async fn network_traffic(&self) -> anyhow::Result<MetricSnapshot> {
        anyhow::bail!("no /proc")
    }
}

/// Records every request; request number `fail_on` (1-based) is rejected with HTTP 400.
#[derive(Default)]
pub struct RecordingTransport {
    pub requests: Mutex<Vec<PublishRequest>>,
    pub fail_on: Option<usize>,
}

impl RecordingTransport {
    pub fn failing_on(n: usize) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_on: Some(n),
        }
    }

    pub fn requests(&self) -> Vec<PublishRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.requests()
            .iter()
            .map(|r| serde_json::from_str(&r.body).expect("json body"))
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(&self, request: &PublishRequest) -> Result<String> {
        let n = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        if self.fail_on == Some(n) {
            return Err(Error::Transport {
                url: request.url.clone(),
                status: Some(400),
                body: Some(format!("{{\"error\": \"request {} rejected\"}}", n)),
                message: "Bad Request".into(),
            });
        }
        Ok(format!("{{\"id\": {}}}", n))
    }
}
