use thiserror::Error;

/// Faults raised by a [`MetricsProvider`](crate::provider::MetricsProvider).
///
/// None of these escape the probe: observation assembly turns them into an
/// UNKNOWN result or into missing counters.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    ServiceManager(#[from] anyhow::Error),

    #[error("procfs: {0}")]
    Procfs(#[from] procfs::ProcError),

    #[error("process {0} exited while it was being sampled")]
    ProcessVanished(u32),

    #[error("process {pid} is now {found}, expected {expected}")]
    ProcessChanged {
        pid: u32,
        expected: String,
        found: String,
    },

    #[error("process {0} reports no anonymous resident memory")]
    MissingMemoryCounter(u32),
}
