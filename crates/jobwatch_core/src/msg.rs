use crate::{JobParameters, ProgressSnapshot, ResultRow, StartError, TickTicket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Operator asked for a new job with already validated parameters.
    StartRequested(JobParameters),
    /// Operator input failed validation; shown as a non-terminal notice.
    InputRejected(String),
    /// The service accepted the start request for generation `epoch`.
    StartAcknowledged { epoch: u64, message: String },
    /// The start request for generation `epoch` was rejected or unreachable.
    StartFailed { epoch: u64, error: StartError },
    /// The poll scheduler fired.
    PollTick,
    ProgressFetched {
        ticket: TickTicket,
        snapshot: ProgressSnapshot,
    },
    /// A single poll failed at the transport level.
    ProgressFetchFailed { ticket: TickTicket, reason: String },
    PreviewFetched {
        ticket: TickTicket,
        rows: Vec<ResultRow>,
    },
    /// Operator cancelled the job.
    StopRequested,
    /// Operator asked to clear the job on both sides.
    ResetRequested,
}
