use jobwatch_logging::{watch_debug, watch_info, watch_warn};

use crate::{classify, Effect, JobState, MonitorState, Msg, ProgressSnapshot, TickTicket, Verdict};

const STOPPED_NOTICE: &str = "Job stopped by operator.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: MonitorState, msg: Msg) -> (MonitorState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartRequested(params) => {
            if state.is_busy() || state.start_in_flight() {
                watch_warn!(
                    "start ignored: job {:?}, previous start pending={}",
                    state.job().phase(),
                    state.start_in_flight()
                );
                Vec::new()
            } else {
                let epoch = state.begin_job();
                watch_info!(
                    "starting job epoch={} query={:?} location={:?} limit={:?}",
                    epoch,
                    params.query,
                    params.location,
                    params.limit
                );
                vec![Effect::SendStart { epoch, params }]
            }
        }
        Msg::InputRejected(notice) => {
            state.set_notice(notice);
            Vec::new()
        }
        Msg::StartAcknowledged { epoch, message } => {
            state.settle_start();
            if epoch == state.epoch() && *state.job() == JobState::Starting {
                state.set_job(JobState::Running(ProgressSnapshot::placeholder(message)));
                vec![Effect::BeginPolling]
            } else {
                // The operator gave up on this job while the service was
                // starting it; the earlier stop may have arrived too soon.
                watch_info!("job epoch={} started after being stopped, stopping it again", epoch);
                vec![Effect::NotifyStop]
            }
        }
        Msg::StartFailed { epoch, error } => {
            state.settle_start();
            if epoch == state.epoch() && *state.job() == JobState::Starting {
                watch_warn!("start failed: {}", error);
                state.set_job(JobState::Failed(error.to_string()));
            } else {
                watch_debug!("discarding start failure for epoch {}", epoch);
            }
            Vec::new()
        }
        Msg::PollTick => {
            if matches!(state.job(), JobState::Running(_)) {
                vec![Effect::FetchProgress(state.issue_ticket())]
            } else {
                // Any tick outside Running means the timer outlived its job.
                vec![Effect::StopPolling]
            }
        }
        Msg::ProgressFetched { ticket, snapshot } => apply_snapshot(&mut state, ticket, snapshot),
        Msg::ProgressFetchFailed { ticket, reason } => {
            if state.record_poll_failure(ticket, reason) {
                watch_warn!(
                    "poll {} failed ({} in a row), retrying on next tick",
                    ticket.seq,
                    state.consecutive_poll_failures()
                );
            }
            Vec::new()
        }
        Msg::PreviewFetched { ticket, rows } => {
            if !state.apply_preview(ticket, rows) {
                watch_debug!("discarding stale preview for tick {:?}", ticket);
            }
            Vec::new()
        }
        Msg::StopRequested => {
            if state.is_busy() {
                watch_info!("stopping job epoch={}", state.epoch());
                state.return_to_idle();
                state.clear_history();
                state.set_notice(STOPPED_NOTICE.to_string());
                vec![Effect::StopPolling, Effect::NotifyStop]
            } else {
                Vec::new()
            }
        }
        Msg::ResetRequested => {
            watch_info!("resetting monitor from {:?}", state.job().phase());
            state.return_to_idle();
            state.clear_history();
            vec![Effect::StopPolling, Effect::NotifyReset]
        }
    };

    (state, effects)
}

fn apply_snapshot(
    state: &mut MonitorState,
    ticket: TickTicket,
    mut snapshot: ProgressSnapshot,
) -> Vec<Effect> {
    if !state.accepts_snapshot(ticket) {
        watch_debug!(
            "discarding snapshot for tick {:?} (epoch {}, state {:?})",
            ticket,
            state.epoch(),
            state.job().phase()
        );
        return Vec::new();
    }

    let previous_count = state.last_snapshot().map(|s| s.current_count);
    state.record_snapshot(ticket, &snapshot);

    // Tickets only order responses by issue time; a reordered pair of
    // responses from a healthy job would still read as a restart here.
    if let Some(previous) = previous_count.filter(|&prev| snapshot.current_count < prev) {
        let reason = format!(
            "Progress counter went backwards ({} -> {}); the remote job was restarted",
            previous, snapshot.current_count
        );
        watch_warn!("{}", reason);
        state.set_job(JobState::Failed(reason));
        return vec![Effect::StopPolling];
    }

    let verdict = classify(&snapshot, state.error_marker());
    let mut effects = match &verdict {
        Verdict::StillRunning => {
            state.set_job(JobState::Running(snapshot));
            Vec::new()
        }
        Verdict::SucceededReadyForDownload | Verdict::SucceededNoArtifact => {
            watch_info!(
                "job finished ({:?}) with {} of {} items",
                verdict,
                snapshot.current_count,
                snapshot.target_count
            );
            if verdict == Verdict::SucceededNoArtifact {
                snapshot.download_ready = false;
            }
            state.set_job(JobState::Completed(snapshot));
            vec![Effect::StopPolling]
        }
        Verdict::FailedWithMessage(message) => {
            watch_warn!("job failed: {}", message);
            state.set_job(JobState::Failed(message.clone()));
            vec![Effect::StopPolling]
        }
    };

    if state.preview_rows() > 0 {
        effects.push(Effect::FetchPreview {
            ticket,
            limit: state.preview_rows(),
        });
    }
    effects
}
