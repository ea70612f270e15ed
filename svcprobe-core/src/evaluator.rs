//! Classification of a [`ServiceObservation`] into a single [`CheckResult`].
//!
//! Checks run as an ordered chain and the first one that matches decides the
//! result. Service-level gates come first, then the per-metric threshold
//! rules, critical before warning within each metric.

use crate::observation::{Metric, ServiceObservation, ThresholdConfig};
use crate::perfdata::counter_summary;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Ok,
    Warning,
    Critical,
}

/// Outcome of a check. `Unknown` means the probe could not determine the
/// service's health and is deliberately kept outside [`Severity`]'s ordering.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum CheckStatus {
    Determined(Severity),
    Unknown,
}

impl CheckStatus {
    pub const OK: CheckStatus = CheckStatus::Determined(Severity::Ok);
    pub const WARNING: CheckStatus = CheckStatus::Determined(Severity::Warning);
    pub const CRITICAL: CheckStatus = CheckStatus::Determined(Severity::Critical);

    pub fn exit_code(&self) -> u8 {
        match self {
            CheckStatus::Determined(Severity::Ok) => 0,
            CheckStatus::Determined(Severity::Warning) => 1,
            CheckStatus::Determined(Severity::Critical) => 2,
            CheckStatus::Unknown => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CheckStatus::Determined(Severity::Ok) => "OK",
            CheckStatus::Determined(Severity::Warning) => "WARNING",
            CheckStatus::Determined(Severity::Critical) => "CRITICAL",
            CheckStatus::Unknown => "UNKNOWN",
        }
    }
}

impl From<Severity> for CheckStatus {
    fn from(severity: Severity) -> Self {
        CheckStatus::Determined(severity)
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub message: String,
}

impl CheckResult {
    /// Line breaks in `message` are folded into `"; "` so the rendered
    /// result is always a single line.
    pub fn new(status: impl Into<CheckStatus>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: single_line(&message.into()),
        }
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::CRITICAL, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Unknown, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.status.exit_code()
    }
}

/// The plugin output line, `WORD - message`.
impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.status, self.message)
    }
}

fn single_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Service-level checks, in the order they are applied. Missing counters
/// are checked after these, in [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Installed,
    Unique,
    Running,
    Healthy,
    ProcessResolved,
}

pub const GATES: [Gate; 5] = [
    Gate::Installed,
    Gate::Unique,
    Gate::Running,
    Gate::Healthy,
    Gate::ProcessResolved,
];

impl Gate {
    /// The failing result for this gate, or `None` if the observation passes.
    pub fn check(&self, observation: &ServiceObservation) -> Option<CheckResult> {
        let name = &observation.name;
        match self {
            Gate::Installed => (!observation.exists).then(|| {
                CheckResult::critical(format!(
                    "Could not find an installed service identified by {}",
                    name
                ))
            }),
            Gate::Unique => (!observation.is_unique).then(|| {
                CheckResult::critical(format!("Multiple services by the name of {} returned", name))
            }),
            Gate::Running => (!observation.state.eq_ignore_ascii_case("Running"))
                .then(|| CheckResult::critical(format!("{} is not running", name))),
            Gate::Healthy => (!observation.status.eq_ignore_ascii_case("OK")).then(|| {
                CheckResult::critical(format!("{} status is {}", name, observation.status))
            }),
            Gate::ProcessResolved => observation.process_name.is_none().then(|| {
                CheckResult::unknown(format!("Could not find the process name for {}", name))
            }),
        }
    }
}

/// A limit on one metric that raises `severity` when reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdRule {
    pub metric: Metric,
    pub severity: Severity,
}

impl ThresholdRule {
    const fn new(metric: Metric, severity: Severity) -> Self {
        Self { metric, severity }
    }

    fn limit(&self, thresholds: &ThresholdConfig) -> Option<u64> {
        match self.severity {
            Severity::Critical => thresholds.crit(self.metric),
            Severity::Warning => thresholds.warn(self.metric),
            Severity::Ok => None,
        }
    }

    /// Limits are inclusive. A rule without a configured limit never fires.
    pub fn breached(&self, value: f64, thresholds: &ThresholdConfig) -> bool {
        self.limit(thresholds).is_some_and(|limit| value >= limit as f64)
    }
}

pub const THRESHOLD_RULES: [ThresholdRule; 6] = [
    ThresholdRule::new(Metric::Cpu, Severity::Critical),
    ThresholdRule::new(Metric::Cpu, Severity::Warning),
    ThresholdRule::new(Metric::Memory, Severity::Critical),
    ThresholdRule::new(Metric::Memory, Severity::Warning),
    ThresholdRule::new(Metric::Faults, Severity::Critical),
    ThresholdRule::new(Metric::Faults, Severity::Warning),
];

pub fn evaluate(observation: &ServiceObservation, thresholds: &ThresholdConfig) -> CheckResult {
    if let Some(result) = GATES.iter().find_map(|gate| gate.check(observation)) {
        return result;
    }

    let Some(counters) = observation.counters() else {
        return CheckResult::unknown(format!(
            "Could not read performance counters for {}",
            observation.name
        ));
    };

    let message = counter_summary(&observation.state, &counters, thresholds);
    let severity = THRESHOLD_RULES
        .iter()
        .find(|rule| rule.breached(counters.value(rule.metric), thresholds))
        .map(|rule| rule.severity)
        .unwrap_or(Severity::Ok);

    CheckResult::new(severity, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy(cpu: u64, memory: f64, faults: u64) -> ServiceObservation {
        ServiceObservation {
            name: "Spooler".to_string(),
            exists: true,
            is_unique: true,
            state: "Running".to_string(),
            status: "OK".to_string(),
            process_id: Some(1234),
            process_name: Some("spoolsv".to_string()),
            cpu_percent: Some(cpu),
            memory_megabytes: Some(memory),
            page_faults_per_sec: Some(faults),
        }
    }

    fn cpu_limits(warn: u64, crit: u64) -> ThresholdConfig {
        ThresholdConfig {
            cpu_warn: Some(warn),
            cpu_crit: Some(crit),
            ..Default::default()
        }
    }

    #[test]
    fn missing_service_wins_over_everything() {
        let observation = ServiceObservation {
            exists: false,
            is_unique: false,
            state: "Exploded".to_string(),
            status: "???".to_string(),
            process_name: None,
            cpu_percent: Some(u64::MAX),
            ..healthy(0, 0.0, 0)
        };
        let result = evaluate(&observation, &cpu_limits(1, 2));
        assert_eq!(
            result.to_string(),
            "CRITICAL - Could not find an installed service identified by Spooler"
        );
        assert_eq!(result.exit_code(), 2);
    }

    #[test]
    fn ambiguous_name_is_critical_even_when_healthy() {
        let observation = ServiceObservation {
            is_unique: false,
            ..healthy(1, 1.0, 1)
        };
        let result = evaluate(&observation, &ThresholdConfig::default());
        assert_eq!(
            result.to_string(),
            "CRITICAL - Multiple services by the name of Spooler returned"
        );
        assert_eq!(result.exit_code(), 2);
    }

    #[test]
    fn stopped_service_is_critical() {
        let observation = ServiceObservation {
            state: "Stopped".to_string(),
            ..healthy(0, 0.0, 0)
        };
        let result = evaluate(&observation, &ThresholdConfig::default());
        assert_eq!(result.to_string(), "CRITICAL - Spooler is not running");
        assert_eq!(result.exit_code(), 2);
    }

    #[test]
    fn state_and_status_compare_case_insensitively() {
        let observation = ServiceObservation {
            state: "RUNNING".to_string(),
            status: "ok".to_string(),
            ..healthy(0, 0.0, 0)
        };
        assert_eq!(evaluate(&observation, &ThresholdConfig::default()).status, CheckStatus::OK);
    }

    #[test]
    fn unhealthy_status_is_reported_verbatim() {
        let observation = ServiceObservation {
            status: "Error".to_string(),
            ..healthy(0, 0.0, 0)
        };
        let result = evaluate(&observation, &ThresholdConfig::default());
        assert_eq!(result.to_string(), "CRITICAL - Spooler status is Error");
    }

    #[test]
    fn unresolved_process_is_unknown_regardless_of_thresholds() {
        let observation = ServiceObservation {
            process_name: None,
            ..healthy(99, 9999.0, 9999)
        };
        let result = evaluate(&observation, &cpu_limits(1, 2));
        assert_eq!(result.to_string(), "UNKNOWN - Could not find the process name for Spooler");
        assert_eq!(result.exit_code(), 3);
    }

    #[test]
    fn missing_counters_are_unknown() {
        let observation = ServiceObservation {
            memory_megabytes: None,
            ..healthy(10, 10.0, 10)
        };
        let result = evaluate(&observation, &ThresholdConfig::default());
        assert_eq!(result.status, CheckStatus::Unknown);
        assert_eq!(result.message, "Could not read performance counters for Spooler");
    }

    #[test]
    fn cpu_between_limits_warns() {
        let result = evaluate(&healthy(80, 20.0, 5), &cpu_limits(50, 90));
        assert_eq!(result.status, CheckStatus::WARNING);
        assert_eq!(result.exit_code(), 1);
        assert!(result.message.contains("cpu=80%;50;90;0;100"));
    }

    #[test]
    fn reaching_the_critical_limit_is_critical() {
        let result = evaluate(&healthy(80, 20.0, 5), &cpu_limits(50, 80));
        assert_eq!(result.status, CheckStatus::CRITICAL);
        assert_eq!(result.exit_code(), 2);
    }

    #[test]
    fn critical_beats_warning_on_the_same_metric() {
        let result = evaluate(&healthy(95, 20.0, 5), &cpu_limits(50, 90));
        assert_eq!(result.status, CheckStatus::CRITICAL);
    }

    #[test]
    fn earlier_metric_decides_when_several_breach() {
        let thresholds = ThresholdConfig {
            cpu_warn: Some(10),
            mem_crit: Some(10),
            ..Default::default()
        };
        let result = evaluate(&healthy(50, 500.0, 0), &thresholds);
        assert_eq!(result.status, CheckStatus::WARNING);
    }

    #[test]
    fn memory_and_fault_limits_apply() {
        let memory = ThresholdConfig {
            mem_warn: Some(100),
            mem_crit: Some(200),
            ..Default::default()
        };
        assert_eq!(evaluate(&healthy(0, 150.5, 0), &memory).status, CheckStatus::WARNING);
        assert_eq!(evaluate(&healthy(0, 200.0, 0), &memory).status, CheckStatus::CRITICAL);
        assert_eq!(evaluate(&healthy(0, 99.99, 0), &memory).status, CheckStatus::OK);

        let faults = ThresholdConfig {
            fault_warn: Some(1000),
            fault_crit: Some(5000),
            ..Default::default()
        };
        assert_eq!(evaluate(&healthy(0, 1.0, 1000), &faults).status, CheckStatus::WARNING);
        assert_eq!(evaluate(&healthy(0, 1.0, 7000), &faults).status, CheckStatus::CRITICAL);
    }

    #[test]
    fn disabled_thresholds_never_fire() {
        let observation = ServiceObservation {
            memory_megabytes: Some(f64::MAX),
            ..healthy(u64::MAX, 0.0, u64::MAX)
        };
        let result = evaluate(&observation, &ThresholdConfig::default());
        assert_eq!(result.status, CheckStatus::OK);
    }

    #[test]
    fn healthy_service_without_thresholds_is_ok_with_perfdata() {
        let result = evaluate(&healthy(12, 64.0, 3), &ThresholdConfig::default());
        assert_eq!(result.exit_code(), 0);
        assert_eq!(
            result.to_string(),
            "OK - State: Running, CPU Utilization: 12%, Memory Utilization: 64.00MB, Faults: 3\
             |cpu=12%;;;0;100 memory=64.00MB;;;; faults=3;;;;"
        );
    }

    #[test]
    fn every_threshold_branch_shares_the_counter_summary() {
        let ok = evaluate(&healthy(80, 20.0, 5), &ThresholdConfig::default());
        let thresholds = ThresholdConfig {
            fault_crit: Some(1),
            ..Default::default()
        };
        let critical = evaluate(&healthy(80, 20.0, 5), &thresholds);
        assert_eq!(critical.status, CheckStatus::CRITICAL);
        assert_eq!(ok.message.split('|').next(), critical.message.split('|').next());
    }

    #[test]
    fn multi_line_messages_render_as_one_line() {
        let result = CheckResult::unknown("first problem\n\n  second problem\r\n");
        assert_eq!(result.to_string(), "UNKNOWN - first problem; second problem");
        assert!(!result.to_string().contains('\n'));
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Ok < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }

    #[test]
    fn exit_codes_match_labels() {
        let pairs = [
            (CheckStatus::OK, "OK", 0),
            (CheckStatus::WARNING, "WARNING", 1),
            (CheckStatus::CRITICAL, "CRITICAL", 2),
            (CheckStatus::Unknown, "UNKNOWN", 3),
        ];
        for (status, label, code) in pairs {
            assert_eq!(status.label(), label);
            assert_eq!(status.exit_code(), code);
        }
    }
}
