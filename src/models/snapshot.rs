// Snapshot and outgoing record shapes

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A flat field name -> value mapping, the unit that is stamped and POSTed.
pub type Record = Map<String, Value>;

/// Raw data a collector returns for one metric family.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricSnapshot {
    /// One record for the whole host (memory, cpu, loadavg).
    Single(Record),
    /// One record per sub-resource, keyed by local resource name (partition, interface).
    Multi(BTreeMap<String, Record>),
}

impl MetricSnapshot {
    pub fn kind(&self) -> &'static str {
        match self {
            MetricSnapshot::Single(_) => "single",
            MetricSnapshot::Multi(_) => "multi",
        }
    }
}

/// Response bodies returned by the remote endpoint for one publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivered {
    Single(String),
    Multi(Vec<String>),
}

impl Delivered {
    pub fn bodies(&self) -> Vec<&str> {
        match self {
            Delivered::Single(body) => vec![body.as_str()],
            Delivered::Multi(bodies) => bodies.iter().map(String::as_str).collect(),
        }
    }

    /// Number of records the remote accepted.
    pub fn len(&self) -> usize {
        match self {
            Delivered::Single(_) => 1,
            Delivered::Multi(bodies) => bodies.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flatten a typed stats struct into a record.
pub fn to_record<T: Serialize>(value: &T) -> serde_json::Result<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => {
            let mut map = Map::new();
            map.insert("value".into(), other);
            Ok(map)
        }
    }
}
