// OS statistics via sysinfo, with /proc readers where sysinfo has no equivalent

mod linux;

use anyhow::Context;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sysinfo::{Disks, Networks, System};
use tracing::instrument;

use crate::models::*;

const MB: u64 = 1024 * 1024;
const KB: u64 = 1024;

/// Source of metric snapshots, one read per metric family.
///
/// Implementations only shape data (units, field names); they know nothing about
/// config maps or the remote server. Sub-resource snapshots are keyed by the local
/// resource name the config maps refer to (`sda1`, `eth0`).
#[async_trait]
pub trait Collector: Send + Sync {
    /// Memory and swap: sizes in MB, `percent_used` / `swap_percent_used` in percent.
    async fn memory(&self) -> anyhow::Result<MetricSnapshot>;

    /// 1/5/15 minute load average plus logical core count.
    async fn load_average(&self) -> anyhow::Result<MetricSnapshot>;

    /// Percent of CPU time per state, sampled over `interval`.
    async fn cpu_utilization(&self, interval: Duration) -> anyhow::Result<MetricSnapshot>;

    /// Usage of the partitions mounted at `path_list`, keyed by device name.
    async fn disk_usage(&self, path_list: &[String]) -> anyhow::Result<MetricSnapshot>;

    /// Cumulative IO counters per block device, byte counters in KB.
    async fn disk_io(&self) -> anyhow::Result<MetricSnapshot>;

    /// Cumulative received/transmitted KB per interface.
    async fn network_traffic(&self) -> anyhow::Result<MetricSnapshot>;
}

pub struct SysinfoCollector {
    sys: Arc<Mutex<System>>,
}

impl Default for SysinfoCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoCollector {
    pub fn new() -> Self {
        Self {
            sys: Arc::new(Mutex::new(System::new())),
        }
    }
}

fn lock(sys: &Mutex<System>) -> anyhow::Result<std::sync::MutexGuard<'_, System>> {
    sys.lock()
        .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))
}

fn memory_stats(sys: &Mutex<System>) -> anyhow::Result<MemoryStats> {
    let mut sys = lock(sys)?;
    sys.refresh_memory();
    let total = sys.total_memory();
    let used = sys.used_memory();
    let swap_total = sys.total_swap();
    let swap_used = sys.used_swap();
    Ok(MemoryStats {
        total: total / MB,
        free: sys.free_memory() / MB,
        used: used / MB,
        percent_used: percent(used, total),
        swap_total: swap_total / MB,
        swap_used: swap_used / MB,
        swap_free: sys.free_swap() / MB,
        swap_percent_used: percent(swap_used, swap_total),
    })
}

fn load_stats(sys: &Mutex<System>) -> anyhow::Result<LoadAverage> {
    let mut sys = lock(sys)?;
    sys.refresh_cpu_all();
    let load = System::load_average();
    Ok(LoadAverage {
        minute: load.one,
        five_minutes: load.five,
        fifteen_minutes: load.fifteen,
        cores: sys.cpus().len() as u32,
        scheduled_processes: linux::read_scheduled_processes(),
    })
}

// Fallback when /proc/stat is unavailable: global busy share only.
fn global_cpu_usage(sys: &Mutex<System>, interval: Duration) -> anyhow::Result<CpuTimesPercent> {
    let mut sys = lock(sys)?;
    sys.refresh_cpu_all();
    std::thread::sleep(interval.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
    sys.refresh_cpu_all();
    let usage = (sys.global_cpu_usage() as f64).clamp(0.0, 100.0);
    Ok(CpuTimesPercent {
        user: usage,
        idle: 100.0 - usage,
        ..Default::default()
    })
}

/// Integer percentage, 0 when `total` is 0.
fn percent(part: u64, total: u64) -> u64 {
    if total == 0 {
        0
    } else {
        (part as f64 / total as f64 * 100.0) as u64
    }
}

/// Usage of one partition from its total and unprivileged-available bytes.
///
/// sysinfo does not expose the free block count, so blocks reserved for root are
/// counted as used: on ext filesystems `used` reads a few percent higher than
/// `df`, and `used + free == total` always holds.
fn partition_usage(volume: String, path: String, total: u64, available: u64) -> PartitionUsage {
    let used = total.saturating_sub(available);
    PartitionUsage {
        total: total / MB,
        used: used / MB,
        free: available / MB,
        percent: percent(used, total),
        volume,
        path,
    }
}

/// Mount points compare without a trailing slash, except the root itself.
fn sanitize_mount(path: &str) -> &str {
    if path == "/" {
        path
    } else {
        path.trim_end_matches('/')
    }
}

fn single<T: serde::Serialize>(value: &T) -> anyhow::Result<MetricSnapshot> {
    Ok(MetricSnapshot::Single(to_record(value)?))
}

fn multi<T: serde::Serialize>(rows: BTreeMap<String, T>) -> anyhow::Result<MetricSnapshot> {
    let mut out = BTreeMap::new();
    for (name, row) in rows {
        out.insert(name, to_record(&row)?);
    }
    Ok(MetricSnapshot::Multi(out))
}

async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
}

#[async_trait]
impl Collector for SysinfoCollector {
    #[instrument(skip(self), fields(collector = "sysinfo", operation = "memory"))]
    async fn memory(&self) -> anyhow::Result<MetricSnapshot> {
        let sys = self.sys.clone();
        single(&blocking(move || memory_stats(&sys)).await?)
    }

    #[instrument(skip(self), fields(collector = "sysinfo", operation = "load_average"))]
    async fn load_average(&self) -> anyhow::Result<MetricSnapshot> {
        let sys = self.sys.clone();
        single(&blocking(move || load_stats(&sys)).await?)
    }

    #[instrument(skip(self), fields(collector = "sysinfo", operation = "cpu_utilization"))]
    async fn cpu_utilization(&self, interval: Duration) -> anyhow::Result<MetricSnapshot> {
        let times = match linux::read_cpu_ticks() {
            Some(prev) => {
                tokio::time::sleep(interval).await;
                let cur = linux::read_cpu_ticks().context("/proc/stat disappeared mid-sample")?;
                linux::cpu_times_percent(&prev, &cur)
            }
            None => {
                let sys = self.sys.clone();
                blocking(move || global_cpu_usage(&sys, interval)).await?
            }
        };
        single(&times)
    }

    #[instrument(skip(self), fields(collector = "sysinfo", operation = "disk_usage"))]
    async fn disk_usage(&self, path_list: &[String]) -> anyhow::Result<MetricSnapshot> {
        let wanted: Vec<String> = path_list
            .iter()
            .map(|p| sanitize_mount(p).to_string())
            .collect();
        let rows = blocking(move || {
            let disks = Disks::new_with_refreshed_list();
            let mut rows = BTreeMap::new();
            for d in disks.list() {
                let mount = d.mount_point().to_string_lossy().into_owned();
                if !wanted.iter().any(|w| *w == mount) {
                    continue;
                }
                let volume = d.name().to_string_lossy().into_owned();
                let name = volume.trim_start_matches("/dev/").to_string();
                rows.insert(
                    name,
                    partition_usage(volume, mount, d.total_space(), d.available_space()),
                );
            }
            Ok(rows)
        })
        .await?;
        tracing::debug!(partitions = rows.len(), "disk usage sampled");
        multi(rows)
    }

    #[instrument(skip(self), fields(collector = "sysinfo", operation = "disk_io"))]
    async fn disk_io(&self) -> anyhow::Result<MetricSnapshot> {
        let rows = blocking(|| {
            linux::read_diskstats().context("disk IO counters require /proc/diskstats")
        })
        .await?;
        multi(rows)
    }

    #[instrument(skip(self), fields(collector = "sysinfo", operation = "network_traffic"))]
    async fn network_traffic(&self) -> anyhow::Result<MetricSnapshot> {
        let rows = blocking(|| {
            let networks = Networks::new_with_refreshed_list();
            Ok(networks
                .list()
                .iter()
                .map(|(name, data)| {
                    (
                        name.clone(),
                        InterfaceTraffic {
                            kb_received: data.total_received() / KB,
                            kb_transmitted: data.total_transmitted() / KB,
                        },
                    )
                })
                .collect::<BTreeMap<_, _>>())
        })
        .await?;
        multi(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_handles_zero_total() {
        assert_eq!(percent(5, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(10, 10), 100);
    }

    #[test]
    fn sanitize_mount_keeps_root() {
        assert_eq!(sanitize_mount("/"), "/");
        assert_eq!(sanitize_mount("/home/"), "/home");
        assert_eq!(sanitize_mount("/var"), "/var");
    }

    #[test]
    fn partition_usage_counts_reserved_blocks_as_used() {
        let usage = partition_usage("/dev/sda1".into(), "/".into(), 100 * MB, 30 * MB);
        assert_eq!(usage.total, 100);
        assert_eq!(usage.used, 70);
        assert_eq!(usage.free, 30);
        assert_eq!(usage.percent, 70);
        assert_eq!(usage.used + usage.free, usage.total);

        let empty = partition_usage("tmpfs".into(), "/run".into(), 0, 0);
        assert_eq!(empty.percent, 0);
    }

    #[tokio::test]
    async fn load_average_snapshot_has_expected_fields() {
        let snapshot = SysinfoCollector::new().load_average().await.unwrap();
        let MetricSnapshot::Single(record) = snapshot else {
            panic!("load average must be a single-object snapshot");
        };
        for key in ["minute", "five_minutes", "fifteen_minutes", "cores"] {
            assert!(record.contains_key(key), "missing {key}");
        }
    }

    #[tokio::test]
    async fn memory_snapshot_has_expected_fields() {
        let snapshot = SysinfoCollector::new().memory().await.unwrap();
        let MetricSnapshot::Single(record) = snapshot else {
            panic!("memory must be a single-object snapshot");
        };
        for key in ["total", "free", "used", "percent_used", "swap_total", "swap_percent_used"] {
            assert!(record.contains_key(key), "missing {key}");
        }
    }
}
