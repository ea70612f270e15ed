use crate::error::ProbeError;
use crate::evaluator::{evaluate, CheckResult};
use crate::monitor::SystemMonitor;
use crate::observation::{ServiceObservation, ThresholdConfig};
use crate::process::CounterSample;
use crate::service::{ServiceLookup, ServiceManager};
use std::time::Duration;

/// Source of service and process facts for one check.
pub trait MetricsProvider {
    fn lookup_service(&self, name: &str) -> Result<ServiceLookup, ProbeError>;

    fn resolve_process_name(&self, pid: u32) -> Option<String>;

    fn sample_counters(&self, pid: u32, process_name: &str) -> Result<CounterSample, ProbeError>;
}

/// systemd for service facts, sysinfo and procfs for process counters.
pub struct SystemProvider {
    services: ServiceManager,
    monitor: SystemMonitor,
}

impl SystemProvider {
    pub fn new(sample_interval: Duration) -> Self {
        Self {
            services: ServiceManager::new(),
            monitor: SystemMonitor::new(sample_interval),
        }
    }
}

impl MetricsProvider for SystemProvider {
    fn lookup_service(&self, name: &str) -> Result<ServiceLookup, ProbeError> {
        Ok(self.services.lookup(name)?)
    }

    fn resolve_process_name(&self, pid: u32) -> Option<String> {
        self.monitor.process_name(pid)
    }

    fn sample_counters(&self, pid: u32, process_name: &str) -> Result<CounterSample, ProbeError> {
        self.monitor.sample(pid, process_name)
    }
}

/// Query `provider` and fold the answers into one observation.
///
/// Process resolution and sampling only happen for a single installed
/// service with a main PID. A sampling failure leaves the counters empty.
pub fn observe<P: MetricsProvider + ?Sized>(
    provider: &P,
    name: &str,
) -> Result<ServiceObservation, ProbeError> {
    let lookup = provider.lookup_service(name)?;
    let mut observation = ServiceObservation::from_lookup(name, &lookup);

    if !observation.exists || !observation.is_unique {
        return Ok(observation);
    }

    let Some(pid) = observation.process_id else {
        tracing::debug!(service = name, state = %observation.state, "service has no main process");
        return Ok(observation);
    };

    let Some(process_name) = provider.resolve_process_name(pid) else {
        tracing::debug!(service = name, pid, "could not resolve process name");
        return Ok(observation);
    };
    observation.process_name = Some(process_name.clone());

    match provider.sample_counters(pid, &process_name) {
        Ok(sample) => Ok(observation.with_counters(&sample)),
        Err(e) => {
            tracing::warn!(service = name, pid, error = %e, "failed to sample process counters");
            Ok(observation)
        }
    }
}

/// Run one complete check. Always produces a result.
pub fn check_service<P: MetricsProvider + ?Sized>(
    provider: &P,
    name: &str,
    thresholds: &ThresholdConfig,
) -> CheckResult {
    for metric in thresholds.inverted() {
        tracing::warn!(?metric, "warning threshold is above critical threshold");
    }

    match observe(provider, name) {
        Ok(observation) => {
            tracing::debug!(?observation, "observed service");
            evaluate(&observation, thresholds)
        }
        Err(e) => CheckResult::unknown(format!(
            "Could not query the service manager for {}: {}",
            name, e
        )),
    }
}
