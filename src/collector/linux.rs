// Linux-specific readers: /proc/stat, /proc/loadavg, /proc/diskstats.

use std::collections::BTreeMap;

use crate::models::{CpuTimesPercent, DiskIoCounters};

/// Cumulative jiffies of the aggregate `cpu` line of /proc/stat.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(super) struct CpuTicks {
    user: u64,
    nice: u64,
    system: u64,
    idle: u64,
    iowait: u64,
    irq: u64,
    softirq: u64,
    steal: u64,
    guest: u64,
    guest_nice: u64,
}

impl CpuTicks {
    // guest time is already accounted in user (and guest_nice in nice)
    fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }
}

/// Parse the aggregate `cpu ` line. Older kernels report fewer columns; missing ones are 0.
pub(super) fn parse_cpu_ticks(content: &str) -> Option<CpuTicks> {
    let line = content.lines().find(|l| l.starts_with("cpu "))?;
    let v: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|f| f.parse().ok())
        .collect::<Option<_>>()?;
    if v.len() < 4 {
        return None;
    }
    let at = |i: usize| v.get(i).copied().unwrap_or(0);
    Some(CpuTicks {
        user: at(0),
        nice: at(1),
        system: at(2),
        idle: at(3),
        iowait: at(4),
        irq: at(5),
        softirq: at(6),
        steal: at(7),
        guest: at(8),
        guest_nice: at(9),
    })
}

/// Percent of the window spent in each state between two readings.
pub(super) fn cpu_times_percent(prev: &CpuTicks, cur: &CpuTicks) -> CpuTimesPercent {
    let d_total = cur.total().saturating_sub(prev.total());
    if d_total == 0 {
        return CpuTimesPercent {
            idle: 100.0,
            ..Default::default()
        };
    }
    let pct = |c: u64, p: u64| 100.0 * c.saturating_sub(p) as f64 / d_total as f64;
    let d_guest = cur.guest.saturating_sub(prev.guest);
    let d_guest_nice = cur.guest_nice.saturating_sub(prev.guest_nice);
    let d_user = cur.user.saturating_sub(prev.user).saturating_sub(d_guest);
    let d_nice = cur.nice.saturating_sub(prev.nice).saturating_sub(d_guest_nice);
    CpuTimesPercent {
        user: 100.0 * d_user as f64 / d_total as f64,
        nice: 100.0 * d_nice as f64 / d_total as f64,
        system: pct(cur.system, prev.system),
        idle: pct(cur.idle, prev.idle),
        iowait: pct(cur.iowait, prev.iowait),
        irq: pct(cur.irq, prev.irq),
        softirq: pct(cur.softirq, prev.softirq),
        steal: pct(cur.steal, prev.steal),
        guest: 100.0 * d_guest as f64 / d_total as f64,
        guest_nice: 100.0 * d_guest_nice as f64 / d_total as f64,
    }
}

/// Fourth field of /proc/loadavg: `running/total` scheduling entities.
pub(super) fn parse_scheduled_processes(content: &str) -> Option<String> {
    let field = content.split_whitespace().nth(3)?;
    let (running, total) = field.split_once('/')?;
    running.parse::<u64>().ok()?;
    total.parse::<u64>().ok()?;
    Some(field.to_string())
}

/// Per-device counters from /proc/diskstats. Sector counts are 512-byte units.
pub(super) fn parse_diskstats(content: &str) -> BTreeMap<String, DiskIoCounters> {
    let mut out = BTreeMap::new();
    for line in content.lines() {
        let f: Vec<&str> = line.split_whitespace().collect();
        if f.len() < 11 {
            continue;
        }
        let num = |i: usize| f[i].parse::<u64>().ok();
        let (
            Some(reads),
            Some(sectors_read),
            Some(read_time),
            Some(writes),
            Some(sectors_written),
            Some(write_time),
        ) = (num(3), num(5), num(6), num(7), num(9), num(10))
        else {
            continue;
        };
        out.insert(
            f[2].to_string(),
            DiskIoCounters {
                read_count: reads,
                write_count: writes,
                read_kb: sectors_read * 512 / 1024,
                write_kb: sectors_written * 512 / 1024,
                read_time,
                write_time,
            },
        );
    }
    out
}

pub(super) fn read_cpu_ticks() -> Option<CpuTicks> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/stat").ok()?;
        parse_cpu_ticks(&content)
    }
    #[cfg(not(target_os = "linux"))]
    None
}

pub(super) fn read_scheduled_processes() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/loadavg").ok()?;
        parse_scheduled_processes(&content)
    }
    #[cfg(not(target_os = "linux"))]
    None
}

pub(super) fn read_diskstats() -> Option<BTreeMap<String, DiskIoCounters>> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/diskstats").ok()?;
        Some(parse_diskstats(&content))
    }
    #[cfg(not(target_os = "linux"))]
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT_A: &str = "cpu  100 0 50 800 50 0 0 0 0 0\ncpu0 100 0 50 800 50 0 0 0 0 0\n";
    const STAT_B: &str = "cpu  160 0 70 900 70 0 0 0 0 0\ncpu0 160 0 70 900 70 0 0 0 0 0\n";

    #[test]
    fn parse_cpu_ticks_reads_aggregate_line() {
        let t = parse_cpu_ticks(STAT_A).unwrap();
        assert_eq!(t.user, 100);
        assert_eq!(t.idle, 800);
        assert_eq!(t.total(), 1000);
    }

    #[test]
    fn parse_cpu_ticks_accepts_short_lines() {
        let t = parse_cpu_ticks("cpu 1 2 3 4\n").unwrap();
        assert_eq!(t.steal, 0);
        assert!(parse_cpu_ticks("cpu 1 2\n").is_none());
        assert!(parse_cpu_ticks("intr 1 2 3 4\n").is_none());
    }

    #[test]
    fn cpu_times_percent_over_window() {
        let a = parse_cpu_ticks(STAT_A).unwrap();
        let b = parse_cpu_ticks(STAT_B).unwrap();
        // window: user 60, system 20, idle 100, iowait 20 => 200
        let p = cpu_times_percent(&a, &b);
        assert_eq!(p.user, 30.0);
        assert_eq!(p.system, 10.0);
        assert_eq!(p.idle, 50.0);
        assert_eq!(p.iowait, 10.0);
    }

    #[test]
    fn cpu_times_percent_without_elapsed_ticks_is_idle() {
        let a = parse_cpu_ticks(STAT_A).unwrap();
        let p = cpu_times_percent(&a, &a);
        assert_eq!(p.idle, 100.0);
        assert_eq!(p.user, 0.0);
    }

    #[test]
    fn guest_time_is_taken_out_of_user() {
        let a = parse_cpu_ticks("cpu 100 0 0 100 0 0 0 0 10 0\n").unwrap();
        let b = parse_cpu_ticks("cpu 200 0 0 200 0 0 0 0 60 0\n").unwrap();
        let p = cpu_times_percent(&a, &b);
        assert_eq!(p.user, 25.0);
        assert_eq!(p.guest, 25.0);
        assert_eq!(p.idle, 50.0);
    }

    #[test]
    fn scheduled_processes_field() {
        assert_eq!(
            parse_scheduled_processes("0.52 0.58 0.59 1/467 12345\n").as_deref(),
            Some("1/467")
        );
        assert!(parse_scheduled_processes("0.52 0.58 0.59\n").is_none());
        assert!(parse_scheduled_processes("0.52 0.58 0.59 x/467 1\n").is_none());
    }

    #[test]
    fn diskstats_converts_sectors_to_kb() {
        let content = "\
   8       0 sda 1000 10 4096 300 2000 20 8192 600 0 900 900
   8       1 sda1 500 5 2048 150 1000 10 4096 300 0 450 450
   7       0 loop0 bogus
";
        let stats = parse_diskstats(content);
        assert_eq!(stats.len(), 2);
        let sda1 = &stats["sda1"];
        assert_eq!(sda1.read_count, 500);
        assert_eq!(sda1.write_count, 1000);
        assert_eq!(sda1.read_kb, 1024);
        assert_eq!(sda1.write_kb, 2048);
        assert_eq!(sda1.read_time, 150);
        assert_eq!(sda1.write_time, 300);
    }
}
