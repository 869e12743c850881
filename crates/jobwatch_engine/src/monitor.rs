use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use jobwatch_core::{
    update, Effect, ErrorMarker, JobParameters, JobState, LimitBounds, MonitorState, Msg,
    StartError, ViewModel,
};
use jobwatch_logging::{watch_debug, watch_warn};
use thiserror::Error;

use crate::{FailureKind, HealthStatus, JobService, PollScheduler, ServiceError};

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub limit_bounds: LimitBounds,
    pub error_marker: ErrorMarker,
    /// Rows requested for the results preview after each poll; 0 disables it.
    pub preview_rows: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            limit_bounds: LimitBounds::default(),
            error_marker: ErrorMarker::default(),
            preview_rows: MonitorState::DEFAULT_PREVIEW_ROWS,
        }
    }
}

/// Receives a fresh view model after every state change.
///
/// Called with the monitor state locked: implementations must not call back
/// into the monitor.
pub trait ViewSink: Send + Sync {
    fn render(&self, view: &ViewModel);
}

/// Sink for callers that only read state on demand.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ViewSink for NullSink {
    fn render(&self, _view: &ViewModel) {}
}

/// Acknowledgement of an accepted start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("no export is ready for download")]
    NotReady,
    #[error("download failed: {0}")]
    Service(#[from] ServiceError),
}

struct Inner {
    state: Mutex<MonitorState>,
    service: Arc<dyn JobService>,
    scheduler: PollScheduler,
    settings: MonitorSettings,
    sink: Arc<dyn ViewSink>,
}

/// Drives one remote job: start, poll until a verdict, stop.
///
/// Cheap to clone; all clones share the same state and scheduler. The poll
/// timer only holds a weak reference, so dropping the last clone disarms it.
#[derive(Clone)]
pub struct JobMonitor {
    inner: Arc<Inner>,
}

impl JobMonitor {
    pub fn new(
        service: Arc<dyn JobService>,
        settings: MonitorSettings,
        sink: Arc<dyn ViewSink>,
    ) -> Self {
        let state = MonitorState::with_settings(settings.error_marker.clone(), settings.preview_rows);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                service,
                scheduler: PollScheduler::new(),
                settings,
                sink,
            }),
        }
    }

    /// Validates `params`, sends the start request and arms polling on success.
    pub async fn start(&self, params: JobParameters) -> Result<Ack, StartError> {
        let params = match params.validate(&self.inner.settings.limit_bounds) {
            Ok(params) => params,
            Err(err) => {
                self.dispatch(Msg::InputRejected(err.to_string()));
                return Err(err);
            }
        };

        let effects = self.dispatch(Msg::StartRequested(params));
        if !effects
            .iter()
            .any(|effect| matches!(effect, Effect::SendStart { .. }))
        {
            return Err(StartError::AlreadyRunning);
        }
        self.execute(effects)
            .await
            .unwrap_or(Err(StartError::AlreadyRunning))
    }

    /// One poll: fetch, classify, apply. Normally invoked by the scheduler.
    pub async fn tick(&self) {
        let effects = self.dispatch(Msg::PollTick);
        self.execute(effects).await;
    }

    /// Operator cancellation. Local state is `Idle` before the service is told.
    ///
    /// A start still awaiting its answer then fails with
    /// [`StartError::Cancelled`], and no new start is accepted until it
    /// resolves.
    pub async fn stop(&self) {
        let effects = self.dispatch(Msg::StopRequested);
        self.execute(effects).await;
    }

    /// Clears the job locally and asks the service to discard its job too.
    pub async fn reset(&self) {
        let effects = self.dispatch(Msg::ResetRequested);
        self.execute(effects).await;
    }

    pub fn current_state(&self) -> JobState {
        self.lock().job().clone()
    }

    pub fn view(&self) -> ViewModel {
        self.lock().view()
    }

    pub fn is_polling(&self) -> bool {
        self.inner.scheduler.is_armed()
    }

    pub async fn check_health(&self) -> Result<HealthStatus, ServiceError> {
        self.inner.service.health().await
    }

    /// Saves the export of the completed job to `dest`.
    pub async fn download_to(&self, dest: &Path) -> Result<u64, DownloadError> {
        let ready = matches!(self.current_state(), JobState::Completed(ref s) if s.download_ready);
        if !ready {
            return Err(DownloadError::NotReady);
        }
        Ok(self.inner.service.download(dest).await?)
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, msg: Msg) -> Vec<Effect> {
        let mut guard = self.lock();
        let state = std::mem::take(&mut *guard);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            // Rendered under the lock so views reach the sink in state order.
            self.inner.sink.render(&state.view());
        }
        *guard = state;
        effects
    }

    /// Runs effects in order; effects produced by follow-up messages are queued
    /// behind them. Returns the start outcome if a start request was sent.
    async fn execute(&self, effects: Vec<Effect>) -> Option<Result<Ack, StartError>> {
        let mut pending: VecDeque<Effect> = effects.into();
        let mut start_outcome = None;

        while let Some(effect) = pending.pop_front() {
            match effect {
                Effect::SendStart { epoch, params } => {
                    let outcome = match self.inner.service.start(&params).await {
                        Ok(message) => {
                            let follow_up = self.dispatch(Msg::StartAcknowledged {
                                epoch,
                                message: message.clone(),
                            });
                            // Without BeginPolling the job was stopped while starting.
                            let outcome = if follow_up.contains(&Effect::BeginPolling) {
                                Ok(Ack { message })
                            } else {
                                Err(StartError::Cancelled)
                            };
                            pending.extend(follow_up);
                            outcome
                        }
                        Err(err) => {
                            let error = start_error(err);
                            pending.extend(self.dispatch(Msg::StartFailed {
                                epoch,
                                error: error.clone(),
                            }));
                            Err(error)
                        }
                    };
                    start_outcome = Some(outcome);
                }
                Effect::BeginPolling => self.arm_scheduler(),
                Effect::StopPolling => {
                    self.inner.scheduler.cancel();
                }
                Effect::FetchProgress(ticket) => {
                    let msg = match self.inner.service.progress().await {
                        Ok(snapshot) => Msg::ProgressFetched { ticket, snapshot },
                        Err(err) => Msg::ProgressFetchFailed {
                            ticket,
                            reason: err.to_string(),
                        },
                    };
                    pending.extend(self.dispatch(msg));
                }
                Effect::FetchPreview { ticket, limit } => {
                    match self.inner.service.results(limit).await {
                        Ok(rows) => pending.extend(self.dispatch(Msg::PreviewFetched { ticket, rows })),
                        Err(err) => watch_debug!("preview fetch failed: {}", err),
                    }
                }
                Effect::NotifyStop => {
                    if let Err(err) = self.inner.service.stop().await {
                        watch_warn!("stop notification failed: {}", err);
                    }
                }
                Effect::NotifyReset => {
                    if let Err(err) = self.inner.service.reset().await {
                        watch_warn!("reset notification failed: {}", err);
                    }
                }
            }
        }

        start_outcome
    }

    fn arm_scheduler(&self) {
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .scheduler
            .begin(self.inner.settings.poll_interval, move || {
                let weak = weak.clone();
                Box::pin(async move {
                    if let Some(inner) = weak.upgrade() {
                        JobMonitor { inner }.tick().await;
                    }
                })
            });
    }
}

fn start_error(err: ServiceError) -> StartError {
    match err.kind {
        FailureKind::HttpStatus(_) => StartError::rejected(err.detail),
        _ => {
            watch_warn!("start request failed: {}", err);
            StartError::unreachable()
        }
    }
}
