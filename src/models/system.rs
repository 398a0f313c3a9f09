// Memory, load average and CPU time models

use serde::Serialize;

/// Memory and swap usage. Sizes in whole MB, percentages as integers.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub percent_used: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub swap_free: u64,
    pub swap_percent_used: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadAverage {
    pub minute: f64,
    pub five_minutes: f64,
    pub fifteen_minutes: f64,
    pub cores: u32,
    /// `running/total` scheduling entities, when the kernel reports them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_processes: Option<String>,
}

/// Share of CPU time spent in each state over the sampling window, in percent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CpuTimesPercent {
    pub user: f64,
    pub nice: f64,
    pub system: f64,
    pub idle: f64,
    pub iowait: f64,
    pub irq: f64,
    pub softirq: f64,
    pub steal: f64,
    pub guest: f64,
    pub guest_nice: f64,
}
