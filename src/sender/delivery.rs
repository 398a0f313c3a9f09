// Delivery strategies: one POST per snapshot, or one POST per sub-resource

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Delivered, Record};
use crate::transport::{PublishRequest, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Exactly one record, one request.
    Single,
    /// One request per record, sent in order; stops at the first failure.
    Multi,
}

impl Delivery {
    pub async fn deliver(
        self,
        family: &'static str,
        url: &str,
        config: &Config,
        records: Vec<Record>,
        transport: &dyn Transport,
    ) -> Result<Delivered> {
        match self {
            Delivery::Single => {
                let found = if records.is_empty() { "empty" } else { "multi" };
                let mut records = records.into_iter();
                let (Some(record), None) = (records.next(), records.next()) else {
                    return Err(Error::SnapshotShape {
                        family,
                        expected: "single",
                        found,
                    });
                };
                let body = post_record(url, config, &record, transport).await?;
                Ok(Delivered::Single(body))
            }
            Delivery::Multi => {
                if records.is_empty() {
                    tracing::info!(family, "no registered resources in snapshot, nothing to send");
                }
                let total = records.len();
                let mut bodies = Vec::with_capacity(total);
                for (i, record) in records.iter().enumerate() {
                    // Earlier records stay published; there is no remote rollback.
                    let body = post_record(url, config, record, transport)
                        .await
                        .inspect_err(|e| {
                            tracing::warn!(
                                family,
                                record = i + 1,
                                total,
                                sent = i,
                                error = %e,
                                "aborting remaining records"
                            );
                        })?;
                    bodies.push(body);
                }
                Ok(Delivered::Multi(bodies))
            }
        }
    }
}

async fn post_record(
    url: &str,
    config: &Config,
    record: &Record,
    transport: &dyn Transport,
) -> Result<String> {
    let body = serde_json::to_string(record)?;
    tracing::debug!(url, bytes = body.len(), "posting record");
    transport
        .post(&PublishRequest::json(url, config, body))
        .await
}
