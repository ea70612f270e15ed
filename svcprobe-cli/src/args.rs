use clap::{ArgAction, Parser};
use std::time::Duration;
use svcprobe_core::ThresholdConfig;
use tracing::Level;

/// Check that a service is running and healthy, and compare its CPU, private
/// memory and page-fault rate against optional limits.
#[derive(Parser, Debug)]
#[command(name = "check_service", version, about)]
pub struct Args {
    /// Service name or glob pattern (".service" is appended when missing)
    #[arg(long)]
    pub name: Option<String>,

    /// CPU utilisation (%) at which to warn
    #[arg(long, value_name = "PERCENT")]
    pub cpu_warn: Option<u64>,

    /// CPU utilisation (%) at which to go critical
    #[arg(long, value_name = "PERCENT")]
    pub cpu_crit: Option<u64>,

    /// Private memory (MB) at which to warn
    #[arg(long, value_name = "MB")]
    pub mem_warn: Option<u64>,

    /// Private memory (MB) at which to go critical
    #[arg(long, value_name = "MB")]
    pub mem_crit: Option<u64>,

    /// Page faults per second at which to warn
    #[arg(long, value_name = "COUNT")]
    pub fault_warn: Option<u64>,

    /// Page faults per second at which to go critical
    #[arg(long, value_name = "COUNT")]
    pub fault_crit: Option<u64>,

    /// Window over which CPU and page faults are measured
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub sample_interval: u64,

    /// Log diagnostics to stderr (repeat for more detail)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn thresholds(&self) -> ThresholdConfig {
        ThresholdConfig {
            cpu_warn: self.cpu_warn,
            cpu_crit: self.cpu_crit,
            mem_warn: self.mem_warn,
            mem_crit: self.mem_crit,
            fault_warn: self.fault_warn,
            fault_crit: self.fault_crit,
        }
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval)
    }

    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}
