// One sender per metric family

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{Delivery, Sender, collect_error, expect_multi, expect_single, registered_records};
use crate::collector::Collector;
use crate::config::{Config, ConfigField};
use crate::decimal::{decimal_value, format_decimal};
use crate::error::Result;
use crate::models::{MetricFamily, MetricSnapshot, Record};

const DISK_USAGE_PARAMS: &[ConfigField] = &[
    ConfigField::Server,
    ConfigField::ServerId,
    ConfigField::Username,
    ConfigField::Password,
    ConfigField::Disk,
    ConfigField::PathList,
];

const DISK_IO_PARAMS: &[ConfigField] = &[
    ConfigField::Server,
    ConfigField::ServerId,
    ConfigField::Username,
    ConfigField::Password,
    ConfigField::Disk,
];

const NETWORK_TRAFFIC_PARAMS: &[ConfigField] = &[
    ConfigField::Server,
    ConfigField::ServerId,
    ConfigField::Username,
    ConfigField::Password,
    ConfigField::NetworkDevices,
];

const LOAD_FIELDS: [&str; 3] = ["minute", "five_minutes", "fifteen_minutes"];

pub struct MemorySender;

#[async_trait]
impl Sender for MemorySender {
    fn family(&self) -> MetricFamily {
        MetricFamily::Memory
    }

    fn delivery(&self) -> Delivery {
        Delivery::Single
    }

    async fn get_data(&self, _config: &Config, collector: &dyn Collector) -> Result<MetricSnapshot> {
        collector.memory().await.map_err(collect_error(self.family()))
    }

    fn shape(&self, snapshot: MetricSnapshot, _config: &Config) -> Result<Vec<Record>> {
        Ok(vec![expect_single(self.family(), snapshot)?])
    }
}

pub struct LoadAvgSender;

#[async_trait]
impl Sender for LoadAvgSender {
    fn family(&self) -> MetricFamily {
        MetricFamily::LoadAvg
    }

    fn delivery(&self) -> Delivery {
        Delivery::Single
    }

    async fn get_data(&self, _config: &Config, collector: &dyn Collector) -> Result<MetricSnapshot> {
        collector
            .load_average()
            .await
            .map_err(collect_error(self.family()))
    }

    /// Load figures become plain numbers; `scheduled_processes` ("1/234") is split
    /// into `processed_entities` and `entities`.
    fn shape(&self, snapshot: MetricSnapshot, _config: &Config) -> Result<Vec<Record>> {
        let mut record = expect_single(self.family(), snapshot)?;
        for key in LOAD_FIELDS {
            if let Some(v) = record.get(key).and_then(decimal_value) {
                record.insert(key.to_string(), Value::from(v));
            }
        }
        if let Some(Value::String(scheduled)) = record.remove("scheduled_processes") {
            match scheduled.split_once('/') {
                Some((running, total)) => {
                    record.insert("processed_entities".into(), entity_count(running));
                    record.insert("entities".into(), entity_count(total));
                }
                None => {
                    tracing::debug!(value = %scheduled, "unrecognized scheduled_processes, dropped");
                }
            }
        }
        Ok(vec![record])
    }
}

fn entity_count(raw: &str) -> Value {
    match raw.trim().parse::<u64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::String(raw.trim().to_string()),
    }
}

pub struct CpuSender;

#[async_trait]
impl Sender for CpuSender {
    fn family(&self) -> MetricFamily {
        MetricFamily::Cpu
    }

    fn delivery(&self) -> Delivery {
        Delivery::Single
    }

    async fn get_data(&self, config: &Config, collector: &dyn Collector) -> Result<MetricSnapshot> {
        collector
            .cpu_utilization(Duration::from_secs(config.cpu_interval_secs))
            .await
            .map_err(collect_error(self.family()))
    }

    /// Every numeric field (`"10,0"`, `"10.0"`, `10.0`) is rendered as `"10.00"`.
    fn shape(&self, snapshot: MetricSnapshot, _config: &Config) -> Result<Vec<Record>> {
        let record = expect_single(self.family(), snapshot)?
            .into_iter()
            .map(|(k, v)| match decimal_value(&v) {
                Some(n) => (k, Value::String(format_decimal(n))),
                None => (k, v),
            })
            .collect();
        Ok(vec![record])
    }
}

pub struct DiskUsageSender;

#[async_trait]
impl Sender for DiskUsageSender {
    fn family(&self) -> MetricFamily {
        MetricFamily::DiskUsage
    }

    fn delivery(&self) -> Delivery {
        Delivery::Multi
    }

    fn required_params(&self) -> &'static [ConfigField] {
        DISK_USAGE_PARAMS
    }

    async fn get_data(&self, config: &Config, collector: &dyn Collector) -> Result<MetricSnapshot> {
        collector
            .disk_usage(&config.path_list)
            .await
            .map_err(collect_error(self.family()))
    }

    fn shape(&self, snapshot: MetricSnapshot, config: &Config) -> Result<Vec<Record>> {
        let rows = expect_multi(self.family(), snapshot)?;
        Ok(registered_records(rows, &config.disk, "disk"))
    }
}

pub struct DiskIoSender;

#[async_trait]
impl Sender for DiskIoSender {
    fn family(&self) -> MetricFamily {
        MetricFamily::DiskIo
    }

    fn delivery(&self) -> Delivery {
        Delivery::Multi
    }

    fn required_params(&self) -> &'static [ConfigField] {
        DISK_IO_PARAMS
    }

    async fn get_data(&self, _config: &Config, collector: &dyn Collector) -> Result<MetricSnapshot> {
        collector.disk_io().await.map_err(collect_error(self.family()))
    }

    fn shape(&self, snapshot: MetricSnapshot, config: &Config) -> Result<Vec<Record>> {
        let rows = expect_multi(self.family(), snapshot)?;
        Ok(registered_records(rows, &config.disk, "disk"))
    }
}

pub struct NetworkTrafficSender;

#[async_trait]
impl Sender for NetworkTrafficSender {
    fn family(&self) -> MetricFamily {
        MetricFamily::NetworkTraffic
    }

    fn delivery(&self) -> Delivery {
        Delivery::Multi
    }

    fn required_params(&self) -> &'static [ConfigField] {
        NETWORK_TRAFFIC_PARAMS
    }

    async fn get_data(&self, _config: &Config, collector: &dyn Collector) -> Result<MetricSnapshot> {
        collector
            .network_traffic()
            .await
            .map_err(collect_error(self.family()))
    }

    fn shape(&self, snapshot: MetricSnapshot, config: &Config) -> Result<Vec<Record>> {
        let rows = expect_multi(self.family(), snapshot)?;
        Ok(registered_records(rows, &config.network_devices, "network_device"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteId;
    use crate::sender::BASE_PARAMS;
    use serde_json::json;

    fn config() -> Config {
        Config::load_from_str(r#"{"server": "http://h", "server_id": "S"}"#).unwrap()
    }

    fn single(v: Value) -> MetricSnapshot {
        MetricSnapshot::Single(v.as_object().cloned().unwrap())
    }

    #[test]
    fn base_params_are_a_prefix_of_every_extended_set() {
        for set in [DISK_USAGE_PARAMS, DISK_IO_PARAMS, NETWORK_TRAFFIC_PARAMS] {
            assert_eq!(&set[..BASE_PARAMS.len()], BASE_PARAMS);
        }
    }

    #[test]
    fn cpu_shape_normalizes_decimals() {
        let out = CpuSender
            .shape(
                single(json!({"user": "10,0", "idle": "89.955", "steal": 0.1, "label": "x"})),
                &config(),
            )
            .unwrap();
        assert_eq!(
            Value::Object(out[0].clone()),
            json!({"user": "10.00", "idle": "89.95", "steal": "0.10", "label": "x"})
        );
    }

    #[test]
    fn loadavg_shape_splits_scheduled_processes() {
        let out = LoadAvgSender
            .shape(
                single(json!({
                    "minute": "0,52",
                    "five_minutes": 0.58,
                    "fifteen_minutes": 0.59,
                    "cores": 4,
                    "scheduled_processes": "2/467"
                })),
                &config(),
            )
            .unwrap();
        let r = &out[0];
        assert_eq!(r["minute"], json!(0.52));
        assert_eq!(r["cores"], json!(4));
        assert_eq!(r["processed_entities"], json!(2));
        assert_eq!(r["entities"], json!(467));
        assert!(!r.contains_key("scheduled_processes"));
    }

    #[test]
    fn loadavg_shape_without_scheduled_processes_is_untouched() {
        let out = LoadAvgSender
            .shape(
                single(json!({"minute": 1.0, "five_minutes": 2.0, "fifteen_minutes": 3.0, "cores": 2})),
                &config(),
            )
            .unwrap();
        assert_eq!(out[0].len(), 4);
        assert!(!out[0].contains_key("entities"));
    }

    #[test]
    fn network_shape_tags_device_id() {
        let mut cfg = config();
        cfg.network_devices.insert("eth0".into(), RemoteId::from("n1"));
        let snapshot = MetricSnapshot::Multi(
            [
                ("eth0".to_string(), json!({"kb_received": 1, "kb_transmitted": 2})),
                ("lo".to_string(), json!({"kb_received": 3, "kb_transmitted": 4})),
            ]
            .into_iter()
            .map(|(k, v)| (k, v.as_object().cloned().unwrap()))
            .collect(),
        );
        let out = NetworkTrafficSender.shape(snapshot, &cfg).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["network_device"], json!("n1"));
        assert_eq!(out[0]["kb_received"], json!(1));
    }
}
