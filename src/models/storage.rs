// Disk usage and disk IO models

use serde::Serialize;

/// Usage of one mounted partition. Sizes in whole MB.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: u64,
    /// Device path, e.g. `/dev/sda1`.
    pub volume: String,
    /// Mount point.
    pub path: String,
}

/// Cumulative IO counters of one block device. Byte counters in KB, times in ms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskIoCounters {
    pub read_count: u64,
    pub write_count: u64,
    pub read_kb: u64,
    pub write_kb: u64,
    pub read_time: u64,
    pub write_time: u64,
}
