use serde::Serialize;

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Resource counters sampled for a service's main process.
#[derive(Debug, Clone, Serialize)]
pub struct CounterSample {
    pub pid: u32,
    /// Share of total machine CPU over the sampling window, 0-100.
    pub cpu_percent: u64,
    /// Private (anonymous) resident memory in bytes.
    pub memory_bytes: u64,
    pub page_faults_per_sec: u64,
    pub sampled_at: chrono::DateTime<chrono::Utc>,
}

impl CounterSample {
    pub fn new(pid: u32, cpu_percent: u64, memory_bytes: u64, page_faults_per_sec: u64) -> Self {
        Self {
            pid,
            cpu_percent,
            memory_bytes,
            page_faults_per_sec,
            sampled_at: chrono::Utc::now(),
        }
    }

    pub fn memory_megabytes(&self) -> f64 {
        self.memory_bytes as f64 / BYTES_PER_MEGABYTE
    }
}

/// Page-fault counter reading taken at one point in time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FaultReading {
    pub total: u64,
    pub taken_at: chrono::DateTime<chrono::Utc>,
}

impl FaultReading {
    pub fn now(total: u64) -> Self {
        Self {
            total,
            taken_at: chrono::Utc::now(),
        }
    }

    /// Faults per second between `self` and a later reading, rounded.
    pub fn rate_until(&self, later: &FaultReading) -> u64 {
        let elapsed_ms = (later.taken_at - self.taken_at).num_milliseconds().max(1);
        let delta = later.total.saturating_sub(self.total);
        (delta as f64 * 1000.0 / elapsed_ms as f64).round() as u64
    }
}
