use crate::process::CounterSample;
use crate::service::ServiceLookup;
use serde::Serialize;

/// Everything the probe learned about one service in one invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceObservation {
    /// Name or pattern the caller asked for.
    pub name: String,
    pub exists: bool,
    pub is_unique: bool,
    pub state: String,
    pub status: String,
    pub process_id: Option<u32>,
    pub process_name: Option<String>,
    pub cpu_percent: Option<u64>,
    pub memory_megabytes: Option<f64>,
    pub page_faults_per_sec: Option<u64>,
}

impl ServiceObservation {
    pub fn from_lookup(name: &str, lookup: &ServiceLookup) -> Self {
        Self {
            name: name.to_string(),
            exists: lookup.found(),
            is_unique: lookup.count <= 1,
            state: lookup.state.clone(),
            status: lookup.status.clone(),
            process_id: lookup.process_id,
            ..Default::default()
        }
    }

    pub fn with_counters(mut self, sample: &CounterSample) -> Self {
        self.cpu_percent = Some(sample.cpu_percent);
        self.memory_megabytes = Some(sample.memory_megabytes());
        self.page_faults_per_sec = Some(sample.page_faults_per_sec);
        self
    }

    /// All three counters, or `None` if any of them could not be sampled.
    pub fn counters(&self) -> Option<Counters> {
        Some(Counters {
            cpu_percent: self.cpu_percent?,
            memory_megabytes: self.memory_megabytes?,
            page_faults_per_sec: self.page_faults_per_sec?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Counters {
    pub cpu_percent: u64,
    pub memory_megabytes: f64,
    pub page_faults_per_sec: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Metric {
    Cpu,
    Memory,
    Faults,
}

impl Counters {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Cpu => self.cpu_percent as f64,
            Metric::Memory => self.memory_megabytes,
            Metric::Faults => self.page_faults_per_sec as f64,
        }
    }
}

/// Warning/critical limits per metric. An absent limit disables that check.
///
/// Memory limits are megabytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ThresholdConfig {
    pub cpu_warn: Option<u64>,
    pub cpu_crit: Option<u64>,
    pub mem_warn: Option<u64>,
    pub mem_crit: Option<u64>,
    pub fault_warn: Option<u64>,
    pub fault_crit: Option<u64>,
}

impl ThresholdConfig {
    pub fn warn(&self, metric: Metric) -> Option<u64> {
        match metric {
            Metric::Cpu => self.cpu_warn,
            Metric::Memory => self.mem_warn,
            Metric::Faults => self.fault_warn,
        }
    }

    pub fn crit(&self, metric: Metric) -> Option<u64> {
        match metric {
            Metric::Cpu => self.cpu_crit,
            Metric::Memory => self.mem_crit,
            Metric::Faults => self.fault_crit,
        }
    }

    /// Metrics whose warning limit is above the critical one. The warning
    /// check for such a metric can only fire between the two, i.e. never.
    pub fn inverted(&self) -> Vec<Metric> {
        [Metric::Cpu, Metric::Memory, Metric::Faults]
            .into_iter()
            .filter(|&metric| match (self.warn(metric), self.crit(metric)) {
                (Some(warn), Some(crit)) => warn > crit,
                _ => false,
            })
            .collect()
    }
}
