use crate::{ErrorMarker, ProgressSnapshot, ResultRow, TickTicket, ViewModel};

/// Lifecycle of the single monitored job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Starting,
    Running(ProgressSnapshot),
    Completed(ProgressSnapshot),
    Failed(String),
}

impl JobState {
    pub fn phase(&self) -> Phase {
        match self {
            JobState::Idle => Phase::Idle,
            JobState::Starting => Phase::Starting,
            JobState::Running(_) => Phase::Running,
            JobState::Completed(_) => Phase::Completed,
            JobState::Failed(_) => Phase::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed(_) | JobState::Failed(_))
    }

    /// True while a start is in flight or the job is being polled.
    pub fn is_busy(&self) -> bool {
        matches!(self, JobState::Starting | JobState::Running(_))
    }
}

/// Data-free mirror of [`JobState`] for rendering and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Starting,
    Running,
    Completed,
    Failed,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Starting => "starting",
            Phase::Running => "running",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        }
    }
}

/// The monitor's single owned state value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorState {
    job: JobState,
    epoch: u64,
    next_seq: u64,
    last_applied_seq: u64,
    last_preview_seq: u64,
    last_snapshot: Option<ProgressSnapshot>,
    preview: Vec<ResultRow>,
    notice: Option<String>,
    consecutive_poll_failures: u32,
    last_poll_error: Option<String>,
    /// Set from sending a start request until its answer arrives, even if the
    /// job was stopped meanwhile.
    start_in_flight: bool,
    error_marker: ErrorMarker,
    preview_rows: usize,
    dirty: bool,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::with_settings(ErrorMarker::default(), Self::DEFAULT_PREVIEW_ROWS)
    }
}

impl MonitorState {
    pub const DEFAULT_PREVIEW_ROWS: usize = 10;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(error_marker: ErrorMarker, preview_rows: usize) -> Self {
        Self {
            job: JobState::Idle,
            epoch: 0,
            next_seq: 0,
            last_applied_seq: 0,
            last_preview_seq: 0,
            last_snapshot: None,
            preview: Vec::new(),
            notice: None,
            consecutive_poll_failures: 0,
            last_poll_error: None,
            start_in_flight: false,
            error_marker,
            preview_rows,
            dirty: false,
        }
    }

    pub fn job(&self) -> &JobState {
        &self.job
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_busy(&self) -> bool {
        self.job.is_busy()
    }

    pub fn start_in_flight(&self) -> bool {
        self.start_in_flight
    }

    pub fn error_marker(&self) -> &ErrorMarker {
        &self.error_marker
    }

    pub fn preview_rows(&self) -> usize {
        self.preview_rows
    }

    pub fn last_snapshot(&self) -> Option<&ProgressSnapshot> {
        self.last_snapshot.as_ref()
    }

    pub fn consecutive_poll_failures(&self) -> u32 {
        self.consecutive_poll_failures
    }

    pub fn view(&self) -> ViewModel {
        ViewModel::from_parts(
            &self.job,
            self.last_snapshot.as_ref(),
            &self.preview,
            self.notice.as_deref(),
            self.poll_warning().as_deref(),
        )
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn poll_warning(&self) -> Option<String> {
        if self.consecutive_poll_failures == 0 {
            return None;
        }
        let reason = self.last_poll_error.as_deref().unwrap_or("unknown error");
        Some(format!(
            "{} consecutive poll failure(s), last: {}",
            self.consecutive_poll_failures, reason
        ))
    }

    pub(crate) fn set_job(&mut self, job: JobState) {
        if self.job != job {
            self.job = job;
            self.dirty = true;
        }
    }

    /// Enters `Starting` for a fresh generation, dropping all prior history.
    pub(crate) fn begin_job(&mut self) -> u64 {
        self.open_generation();
        self.notice = None;
        self.preview.clear();
        self.last_snapshot = None;
        self.start_in_flight = true;
        self.set_job(JobState::Starting);
        self.dirty = true;
        self.epoch
    }

    /// Returns to `Idle` under a new generation so in-flight responses are dropped.
    pub(crate) fn return_to_idle(&mut self) {
        self.open_generation();
        self.set_job(JobState::Idle);
    }

    pub(crate) fn settle_start(&mut self) {
        self.start_in_flight = false;
    }

    pub(crate) fn clear_history(&mut self) {
        self.preview.clear();
        self.last_snapshot = None;
        self.notice = None;
        self.dirty = true;
    }

    fn open_generation(&mut self) {
        self.epoch += 1;
        self.next_seq = 0;
        self.last_applied_seq = 0;
        self.last_preview_seq = 0;
        self.consecutive_poll_failures = 0;
        self.last_poll_error = None;
    }

    pub(crate) fn set_notice(&mut self, notice: String) {
        self.notice = Some(notice);
        self.dirty = true;
    }

    pub(crate) fn issue_ticket(&mut self) -> TickTicket {
        self.next_seq += 1;
        TickTicket {
            epoch: self.epoch,
            seq: self.next_seq,
        }
    }

    /// A snapshot is applied only for the current generation, while running,
    /// and only if no newer tick has landed already.
    pub(crate) fn accepts_snapshot(&self, ticket: TickTicket) -> bool {
        ticket.epoch == self.epoch
            && matches!(self.job, JobState::Running(_))
            && ticket.seq > self.last_applied_seq
    }

    pub(crate) fn record_snapshot(&mut self, ticket: TickTicket, snapshot: &ProgressSnapshot) {
        self.last_applied_seq = ticket.seq;
        self.last_snapshot = Some(snapshot.clone());
        if self.consecutive_poll_failures > 0 {
            self.consecutive_poll_failures = 0;
            self.last_poll_error = None;
            self.dirty = true;
        }
    }

    pub(crate) fn record_poll_failure(&mut self, ticket: TickTicket, reason: String) -> bool {
        if ticket.epoch != self.epoch
            || !matches!(self.job, JobState::Running(_))
            || ticket.seq <= self.last_applied_seq
        {
            return false;
        }
        self.consecutive_poll_failures += 1;
        self.last_poll_error = Some(reason);
        self.dirty = true;
        true
    }

    pub(crate) fn apply_preview(&mut self, ticket: TickTicket, rows: Vec<ResultRow>) -> bool {
        if ticket.epoch != self.epoch
            || ticket.seq <= self.last_preview_seq
            || matches!(self.job, JobState::Idle | JobState::Starting)
        {
            return false;
        }
        self.last_preview_seq = ticket.seq;
        if self.preview != rows {
            self.preview = rows;
            self.dirty = true;
        }
        true
    }
}
