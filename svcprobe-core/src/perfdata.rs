use crate::observation::{Counters, Metric, ThresholdConfig};
use std::fmt;

/// One `label=value[uom];warn;crit;min;max` performance-data entry.
///
/// Absent fields render as empty strings so that a disabled threshold is not
/// mistaken for a zero threshold by graphing tools.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfDatum {
    pub label: &'static str,
    pub value: String,
    pub unit: &'static str,
    pub warn: Option<u64>,
    pub crit: Option<u64>,
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl PerfDatum {
    pub fn for_metric(metric: Metric, counters: &Counters, thresholds: &ThresholdConfig) -> Self {
        let (label, value, unit, min, max) = match metric {
            Metric::Cpu => ("cpu", counters.cpu_percent.to_string(), "%", Some(0), Some(100)),
            Metric::Memory => {
                let value = format!("{:.2}", counters.memory_megabytes);
                ("memory", value, "MB", None, None)
            }
            Metric::Faults => ("faults", counters.page_faults_per_sec.to_string(), "", None, None),
        };

        Self {
            label,
            value,
            unit,
            warn: thresholds.warn(metric),
            crit: thresholds.crit(metric),
            min,
            max,
        }
    }
}

fn field(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl fmt::Display for PerfDatum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}{};{};{};{};{}",
            self.label,
            self.value,
            self.unit,
            field(self.warn),
            field(self.crit),
            field(self.min),
            field(self.max)
        )
    }
}

/// Operator-facing counter summary followed by the performance data.
pub fn counter_summary(state: &str, counters: &Counters, thresholds: &ThresholdConfig) -> String {
    let perfdata = [Metric::Cpu, Metric::Memory, Metric::Faults]
        .into_iter()
        .map(|metric| PerfDatum::for_metric(metric, counters, thresholds).to_string())
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "State: {}, CPU Utilization: {}%, Memory Utilization: {:.2}MB, Faults: {}|{}",
        state,
        counters.cpu_percent,
        counters.memory_megabytes,
        counters.page_faults_per_sec,
        perfdata
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters() -> Counters {
        Counters {
            cpu_percent: 12,
            memory_megabytes: 48.128,
            page_faults_per_sec: 3,
        }
    }

    #[test]
    fn unset_thresholds_render_empty() {
        let summary = counter_summary("Running", &counters(), &ThresholdConfig::default());
        assert_eq!(
            summary,
            "State: Running, CPU Utilization: 12%, Memory Utilization: 48.13MB, Faults: 3\
             |cpu=12%;;;0;100 memory=48.13MB;;;; faults=3;;;;"
        );
    }

    #[test]
    fn thresholds_are_passed_through_without_units() {
        let thresholds = ThresholdConfig {
            cpu_warn: Some(50),
            cpu_crit: Some(90),
            mem_warn: Some(256),
            mem_crit: Some(512),
            fault_warn: Some(1000),
            fault_crit: Some(5000),
        };
        let summary = counter_summary("Running", &counters(), &thresholds);
        assert!(summary.ends_with(
            "|cpu=12%;50;90;0;100 memory=48.13MB;256;512;; faults=3;1000;5000;;"
        ));
    }

    #[test]
    fn zero_threshold_is_not_the_same_as_unset() {
        let thresholds = ThresholdConfig {
            fault_warn: Some(0),
            ..Default::default()
        };
        let datum = PerfDatum::for_metric(Metric::Faults, &counters(), &thresholds);
        assert_eq!(datum.to_string(), "faults=3;0;;;");
    }
}
