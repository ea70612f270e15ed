use crate::error::ProbeError;
use crate::process::{CounterSample, FaultReading};
use parking_lot::Mutex;
use std::time::Duration;
use sysinfo::{CpuRefreshKind, Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

const BYTES_PER_KILOBYTE: u64 = 1024;

pub struct SystemMonitor {
    system: Mutex<System>,
    sample_interval: Duration,
}

impl SystemMonitor {
    pub fn new(sample_interval: Duration) -> Self {
        // Only the CPU list is needed up front, to normalise process CPU usage
        let system = System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::new()));

        Self {
            system: Mutex::new(system),
            sample_interval: sample_interval.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }

    pub fn sample_interval(&self) -> Duration {
        self.sample_interval
    }

    fn refresh_process(system: &mut System, pid: Pid, kind: ProcessRefreshKind) -> bool {
        system.refresh_processes_specifics(ProcessesToUpdate::Some(&[pid]), true, kind) > 0
    }

    pub fn process_name(&self, pid: u32) -> Option<String> {
        let mut system = self.system.lock();
        let pid = Pid::from_u32(pid);

        if !Self::refresh_process(&mut system, pid, ProcessRefreshKind::new()) {
            return None;
        }

        system
            .process(pid)
            .map(|process| process.name().to_string_lossy().to_string())
            .filter(|name| !name.is_empty())
    }

    /// Sample CPU, private memory and page faults for `pid` over one interval.
    pub fn sample(&self, pid: u32, expected_name: &str) -> Result<CounterSample, ProbeError> {
        let handle = procfs::process::Process::new(pid as i32)?;
        let sys_pid = Pid::from_u32(pid);
        let mut system = self.system.lock();

        let cpu_kind = ProcessRefreshKind::new().with_cpu();
        let first_faults = FaultReading::now(total_faults(&handle)?);
        if !Self::refresh_process(&mut system, sys_pid, cpu_kind) {
            return Err(ProbeError::ProcessVanished(pid));
        }

        std::thread::sleep(self.sample_interval);

        if !Self::refresh_process(&mut system, sys_pid, cpu_kind) {
            return Err(ProbeError::ProcessVanished(pid));
        }
        let last_faults = FaultReading::now(total_faults(&handle)?);

        let process = system.process(sys_pid).ok_or(ProbeError::ProcessVanished(pid))?;
        let name = process.name().to_string_lossy();
        if name != expected_name {
            return Err(ProbeError::ProcessChanged {
                pid,
                expected: expected_name.to_string(),
                found: name.to_string(),
            });
        }

        let cpu_count = system.cpus().len().max(1);
        let cpu_percent = (process.cpu_usage() / cpu_count as f32).round().max(0.0) as u64;

        let memory_bytes = handle
            .status()?
            .rssanon
            .ok_or(ProbeError::MissingMemoryCounter(pid))?
            * BYTES_PER_KILOBYTE;

        let page_faults_per_sec = first_faults.rate_until(&last_faults);

        tracing::debug!(
            pid,
            cpu_percent,
            memory_bytes,
            page_faults_per_sec,
            interval_ms = self.sample_interval.as_millis() as u64,
            "sampled process counters"
        );

        Ok(CounterSample::new(pid, cpu_percent, memory_bytes, page_faults_per_sec))
    }
}

fn total_faults(process: &procfs::process::Process) -> Result<u64, ProbeError> {
    let stat = process.stat()?;
    Ok(stat.minflt + stat.majflt)
}
