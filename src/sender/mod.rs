// Senders: validate config, collect one metric family, stamp and deliver it

mod delivery;
mod families;

pub use delivery::Delivery;
pub use families::{
    CpuSender, DiskIoSender, DiskUsageSender, LoadAvgSender, MemorySender, NetworkTrafficSender,
};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::collector::Collector;
use crate::config::{Config, ConfigField, RemoteId};
use crate::error::{Error, Result};
use crate::models::{Delivered, MetricFamily, MetricSnapshot, Record, endpoint_url};
use crate::transport::Transport;

/// Fields every sender needs: where to publish, as whom, for which host.
pub const BASE_PARAMS: &[ConfigField] = &[
    ConfigField::Server,
    ConfigField::ServerId,
    ConfigField::Username,
    ConfigField::Password,
];

/// Publishes one metric family.
///
/// Implementors provide the family, its delivery strategy, the collector call and
/// the family-specific shaping; validation, stamping and transmission are shared.
#[async_trait]
pub trait Sender: Send + Sync {
    fn family(&self) -> MetricFamily;

    fn delivery(&self) -> Delivery;

    fn name(&self) -> &'static str {
        self.family().name()
    }

    /// Config fields that must be present and non-empty before this sender runs.
    fn required_params(&self) -> &'static [ConfigField] {
        BASE_PARAMS
    }

    fn url(&self, config: &Config) -> Result<String> {
        endpoint_url(&config.server, self.name())
    }

    /// Fails with every missing field named; never partially proceeds.
    fn validate(&self, config: &Config) -> Result<()> {
        let missing = config.missing(self.required_params());
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::ConfigValidation {
                family: self.name(),
                missing,
            })
        }
    }

    async fn get_data(&self, config: &Config, collector: &dyn Collector)
    -> Result<MetricSnapshot>;

    /// Turn a snapshot into unstamped outgoing records.
    fn shape(&self, snapshot: MetricSnapshot, config: &Config) -> Result<Vec<Record>>;

    async fn send(
        &self,
        config: &Config,
        collector: &dyn Collector,
        transport: &dyn Transport,
    ) -> Result<Delivered> {
        self.validate(config)?;
        let url = self.url(config)?;
        let snapshot = self.get_data(config, collector).await?;
        let created = created_now();
        let server = config.server_id.to_value();
        let records = self
            .shape(snapshot, config)?
            .into_iter()
            .map(|mut record| {
                stamp(&mut record, &server, &created);
                record
            })
            .collect();
        let delivered = self
            .delivery()
            .deliver(self.name(), &url, config, records, transport)
            .await?;
        tracing::info!(family = self.name(), records = delivered.len(), url = %url, "published");
        Ok(delivered)
    }
}

/// Local wall-clock time, ISO-8601 without offset.
pub fn created_now() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Add delivery metadata: `created` timestamp and `server` (the host's remote id,
/// as stored in config). Other fields are left untouched.
pub fn stamp(record: &mut Record, server: &Value, created: &str) {
    record.insert("created".into(), Value::String(created.to_string()));
    record.insert("server".into(), server.clone());
}

pub(crate) fn collect_error(family: MetricFamily) -> impl FnOnce(anyhow::Error) -> Error {
    move |e| Error::Collect {
        family: family.name(),
        message: format!("{:#}", e),
    }
}

pub(crate) fn expect_single(family: MetricFamily, snapshot: MetricSnapshot) -> Result<Record> {
    match snapshot {
        MetricSnapshot::Single(record) => Ok(record),
        other => Err(Error::SnapshotShape {
            family: family.name(),
            expected: "single",
            found: other.kind(),
        }),
    }
}

pub(crate) fn expect_multi(
    family: MetricFamily,
    snapshot: MetricSnapshot,
) -> Result<BTreeMap<String, Record>> {
    match snapshot {
        MetricSnapshot::Multi(rows) => Ok(rows),
        other => Err(Error::SnapshotShape {
            family: family.name(),
            expected: "multi",
            found: other.kind(),
        }),
    }
}

/// Keep only sub-resources registered in `registry`, tagging each with its remote id
/// under `id_field`. Unregistered resources are skipped, not errors.
pub(crate) fn registered_records(
    rows: BTreeMap<String, Record>,
    registry: &BTreeMap<String, RemoteId>,
    id_field: &str,
) -> Vec<Record> {
    rows.into_iter()
        .filter_map(|(name, mut row)| match registry.get(&name) {
            Some(id) => {
                row.insert(id_field.to_string(), id.to_value());
                Some(row)
            }
            None => {
                tracing::debug!(resource = %name, "not registered, skipping");
                None
            }
        })
        .collect()
}
