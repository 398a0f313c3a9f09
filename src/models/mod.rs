// Domain models: metric families, snapshots and the typed stats collectors produce

mod family;
mod network;
mod snapshot;
mod storage;
mod system;

pub use family::{MetricFamily, endpoint_url, url_path};
pub use network::InterfaceTraffic;
pub use snapshot::{Delivered, MetricSnapshot, Record, to_record};
pub use storage::{DiskIoCounters, PartitionUsage};
pub use system::{CpuTimesPercent, LoadAverage, MemoryStats};
