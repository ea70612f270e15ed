pub mod error;
pub mod evaluator;
pub mod monitor;
pub mod observation;
pub mod perfdata;
pub mod process;
pub mod provider;
pub mod service;


pub use error::ProbeError;
pub use evaluator::{evaluate, CheckResult, CheckStatus, Severity};
pub use monitor::SystemMonitor;
pub use observation::{Metric, ServiceObservation, ThresholdConfig};
pub use process::CounterSample;
pub use provider::{check_service, observe, MetricsProvider, SystemProvider};
pub use service::{ServiceLookup, ServiceManager, ServiceState};
