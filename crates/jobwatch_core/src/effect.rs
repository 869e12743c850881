use crate::JobParameters;

/// Identifies one scheduler tick within one job generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickTicket {
    pub epoch: u64,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the start request for generation `epoch`.
    SendStart { epoch: u64, params: JobParameters },
    /// Arm the poll scheduler (idempotent).
    BeginPolling,
    /// Disarm the poll scheduler (idempotent).
    StopPolling,
    FetchProgress(TickTicket),
    FetchPreview { ticket: TickTicket, limit: usize },
    /// Best-effort stop notification to the service.
    NotifyStop,
    /// Best-effort reset notification to the service.
    NotifyReset,
}
